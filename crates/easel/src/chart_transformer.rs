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

//! Reshapes tabular rows into the series layout each chart type expects.
//!
//! Category labels come from the first cell of each row and values from the
//! second, matching how query results arrive from the source (grouping column
//! first, aggregate second). An empty `series` means there is nothing to draw.

use crate::chart_type::{ChartShape, ChartType};
use crate::data_analyzer::DataInsights;
use crate::tabular::{Row, TabularResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SINGLE_DIMENSION_SERIES: &str = "Count";
pub const SCATTER_SERIES: &str = "Data Points";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformedChartData {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub categories: Option<Vec<String>>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<DataPoint>,
}

/// One entry of `series[].data`. Values that do not coerce to a number are
/// kept as `null` so that positions stay aligned with `categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataPoint {
    Value(Option<f64>),
    Point(Option<f64>, Option<f64>),
    Slice { name: String, y: Option<f64> },
}

/// How repeated category labels are folded when there is no measure column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateCategoryPolicy {
    /// A later row replaces the value of an earlier row with the same label.
    #[default]
    LastWins,
    /// Values of rows sharing a label are added together.
    Sum,
}

/// Which row cells feed a scatter plot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScatterColumns {
    /// Positions of the first two measure columns.
    #[default]
    MeasurePositions,
    /// Cells 0 and 1 regardless of which columns are measures.
    LeadingCells,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub duplicate_categories: DuplicateCategoryPolicy,
    pub scatter_columns: ScatterColumns,
}

impl TransformedChartData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl DataPoint {
    pub fn y(&self) -> Option<f64> {
        match self {
            DataPoint::Value(v) => *v,
            DataPoint::Point(_, y) => *y,
            DataPoint::Slice { y, .. } => *y,
        }
    }
}

/// Same as [`transform_for_chart`] for a free-text type name; anything
/// unrecognised takes the column path.
pub fn transform_for_named_chart(
    name: &str,
    data: &TabularResult,
    insights: &DataInsights,
    config: &TransformConfig,
) -> TransformedChartData {
    transform_for_chart(ChartType::from_name_or_default(name), data, insights, config)
}

pub fn transform_for_chart(
    chart_type: ChartType,
    data: &TabularResult,
    insights: &DataInsights,
    config: &TransformConfig,
) -> TransformedChartData {
    let transformed = match chart_type.shape() {
        ChartShape::Categorical => transform_categorical(data, insights, config),
        ChartShape::Proportional => transform_proportional(data, insights, config),
        ChartShape::Coordinate => transform_coordinates(data, insights, config),
    };
    debug!(
        chart = %chart_type,
        series = transformed.series.len(),
        points = transformed.series.first().map_or(0, |s| s.data.len()),
        "Transformed rows for chart"
    );
    transformed
}

fn row_label(row: &Row) -> String {
    row.first().map(|cell| cell.label()).unwrap_or_default()
}

fn row_value(row: &Row, position: usize) -> Option<f64> {
    row.get(position).and_then(|cell| cell.as_number())
}

/// Labels from cell 0 mapped to the numeric value of cell 1, folded per the
/// duplicate policy. Keys keep first-seen order.
fn keyed_values(
    data: &TabularResult,
    policy: DuplicateCategoryPolicy,
) -> IndexMap<String, Option<f64>> {
    let mut keyed: IndexMap<String, Option<f64>> = IndexMap::new();
    for row in &data.rows {
        let label = row_label(row);
        let value = row_value(row, 1);
        match policy {
            DuplicateCategoryPolicy::LastWins => {
                keyed.insert(label, value);
            }
            DuplicateCategoryPolicy::Sum => {
                let slot = keyed.entry(label).or_insert(None);
                if let Some(v) = value {
                    *slot = Some(slot.unwrap_or(0.0) + v);
                }
            }
        }
    }
    keyed
}

fn transform_categorical(
    data: &TabularResult,
    insights: &DataInsights,
    config: &TransformConfig,
) -> TransformedChartData {
    match (insights.first_dimension(), insights.first_measure()) {
        (Some(_), None) => {
            let keyed = keyed_values(data, config.duplicate_categories);
            let (categories, values): (Vec<String>, Vec<DataPoint>) = keyed
                .into_iter()
                .map(|(label, value)| (label, DataPoint::Value(value)))
                .unzip();
            TransformedChartData {
                categories: Some(categories),
                series: vec![Series {
                    name: SINGLE_DIMENSION_SERIES.to_string(),
                    data: values,
                }],
            }
        }
        (Some(_), Some(measure)) => {
            let categories = data.rows.iter().map(row_label).collect();
            let values = data
                .rows
                .iter()
                .map(|row| DataPoint::Value(row_value(row, 1)))
                .collect();
            TransformedChartData {
                categories: Some(categories),
                series: vec![Series {
                    name: measure.name.clone(),
                    data: values,
                }],
            }
        }
        _ => TransformedChartData::empty(),
    }
}

fn transform_proportional(
    data: &TabularResult,
    insights: &DataInsights,
    config: &TransformConfig,
) -> TransformedChartData {
    match (insights.first_dimension(), insights.first_measure()) {
        (Some(_), None) => {
            let slices = keyed_values(data, config.duplicate_categories)
                .into_iter()
                .map(|(name, y)| DataPoint::Slice { name, y })
                .collect();
            TransformedChartData {
                categories: None,
                series: vec![Series {
                    name: SINGLE_DIMENSION_SERIES.to_string(),
                    data: slices,
                }],
            }
        }
        (Some(_), Some(measure)) => {
            let slices = data
                .rows
                .iter()
                .map(|row| DataPoint::Slice {
                    name: row_label(row),
                    y: row_value(row, 1),
                })
                .collect();
            TransformedChartData {
                categories: None,
                series: vec![Series {
                    name: measure.name.clone(),
                    data: slices,
                }],
            }
        }
        _ => TransformedChartData::empty(),
    }
}

fn transform_coordinates(
    data: &TabularResult,
    insights: &DataInsights,
    config: &TransformConfig,
) -> TransformedChartData {
    let measures: Vec<usize> = insights.measures().map(|m| m.position).collect();
    if measures.len() < 2 {
        return TransformedChartData::empty();
    }
    let (x_at, y_at) = match config.scatter_columns {
        ScatterColumns::MeasurePositions => (measures[0], measures[1]),
        ScatterColumns::LeadingCells => (0, 1),
    };
    let points = data
        .rows
        .iter()
        .map(|row| DataPoint::Point(row_value(row, x_at), row_value(row, y_at)))
        .collect();
    TransformedChartData {
        categories: None,
        series: vec![Series {
            name: SCATTER_SERIES.to_string(),
            data: points,
        }],
    }
}
