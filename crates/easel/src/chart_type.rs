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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Column,
    Line,
    Pie,
    Scatter,
    Area,
    Donut,
}

/// The data layout a chart type consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartShape {
    /// Parallel category labels and numeric series values.
    Categorical,
    /// `{name, y}` slices.
    Proportional,
    /// `[x, y]` pairs.
    Coordinate,
}

impl ChartType {
    pub const ALL: [ChartType; 7] = [
        ChartType::Bar,
        ChartType::Column,
        ChartType::Line,
        ChartType::Pie,
        ChartType::Scatter,
        ChartType::Area,
        ChartType::Donut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Column => "column",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Area => "area",
            ChartType::Donut => "donut",
        }
    }

    pub fn shape(&self) -> ChartShape {
        match self {
            ChartType::Bar | ChartType::Column | ChartType::Line | ChartType::Area => {
                ChartShape::Categorical
            }
            ChartType::Pie | ChartType::Donut => ChartShape::Proportional,
            ChartType::Scatter => ChartShape::Coordinate,
        }
    }

    /// Case-insensitive lookup that maps anything unrecognised to `Column`.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or(ChartType::Column)
    }

    /// `"line"` becomes `"Line Chart"`.
    pub fn display_title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{}{} Chart", first.to_ascii_uppercase(), chars.as_str()),
            None => "Chart".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChartType(pub String);

impl fmt::Display for UnknownChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown chart type '{}'", self.0)
    }
}

impl std::error::Error for UnknownChartType {}

impl FromStr for ChartType {
    type Err = UnknownChartType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ChartType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| UnknownChartType(s.to_string()))
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
