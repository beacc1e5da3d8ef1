// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "easel-chart-demo")]
#[command(about = "Profile a query result and turn it into a Highcharts configuration")]
#[command(version)]
pub struct Args {
    /// Query result as JSON (`columns`/`rows`) or CSV with a header row.
    pub input: PathBuf,

    #[arg(long, value_enum, default_value = "chart", help = "What to print")]
    pub output: OutputMode,

    #[arg(long, default_value = "Show me the most useful chart for this data")]
    pub request: String,

    #[arg(long, help = "File holding a model reply to build the chart from")]
    pub response: Option<PathBuf>,

    #[arg(long, help = "YAML file with analysis, transform and render settings")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Project name for the export request (export output only)")]
    pub project: Option<String>,

    #[arg(long, value_enum, default_value = "info", help = "Set the logging level")]
    pub log_level: LogLevel,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Insights,
    Suggestions,
    Prompt,
    Chart,
    Export,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
