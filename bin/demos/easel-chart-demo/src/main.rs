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

mod cli;
mod setup;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Args, OutputMode};
use easel::{ChartAssistant, ChartConfiguration, ExportRequest};
use setup::ReplayModel;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup::setup_logging(args.log_level.as_str());

    let data = setup::load_table(&args.input)?;
    let assistant = ChartAssistant::with_config(setup::load_config(args.config.as_deref())?)?;

    let output = match args.output {
        OutputMode::Insights => serde_json::to_string_pretty(&assistant.analyze(&data))?,
        OutputMode::Suggestions => serde_json::to_string_pretty(&assistant.suggest(&data))?,
        OutputMode::Prompt => assistant.prompt_for(&args.request, &data),
        OutputMode::Chart => serde_json::to_string_pretty(&chart(&assistant, &args, &data).await?)?,
        OutputMode::Export => {
            let Some(project) = args.project.as_deref() else {
                bail!("--project is required for export output");
            };
            let config = chart(&assistant, &args, &data).await?;
            let request = ExportRequest::new(project, &config)?;
            serde_json::to_string_pretty(&request)?
        }
    };
    println!("{output}");
    Ok(())
}

async fn chart(
    assistant: &ChartAssistant,
    args: &Args,
    data: &easel::TabularResult,
) -> Result<ChartConfiguration> {
    let config = match &args.response {
        Some(path) => {
            let model = ReplayModel::new(path.clone());
            assistant.respond(&args.request, data, &model).await
        }
        None => {
            info!("No model reply given, using the top suggestion");
            assistant.fallback(data)
        }
    };
    let config = config.context("the data has no columns to chart")?;
    if config.has_nothing_to_draw() {
        warn!(chart = %config.chart_type, "Chart has no series for this data");
    }
    Ok(config)
}
