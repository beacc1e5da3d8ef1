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

use crate::chart_transformer::{transform_for_chart, TransformConfig, TransformedChartData};
use crate::chart_type::ChartType;
use crate::data_analyzer::{DataAnalyzer, DataInsights};
use crate::error::{utils, ConfigResult};
use crate::model::{extract_specification, ModelSpecification};
use crate::tabular::TabularResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

pub const DEFAULT_MODEL_CONFIDENCE: f64 = 0.8;

/// What the rendering surface receives. `render_options` is a Highcharts
/// options object and is otherwise opaque to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfiguration {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub title: String,
    pub explanation: String,
    pub confidence: f64,
    #[serde(alias = "highchartsConfig")]
    pub render_options: Value,
}

impl ChartConfiguration {
    /// True when the series list is missing or empty.
    pub fn has_nothing_to_draw(&self) -> bool {
        self.render_options
            .get("series")
            .and_then(Value::as_array)
            .map_or(true, Vec::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    pub height: u32,
    pub donut_inner_size: String,
    pub pie_label_format: String,
    pub show_credits: bool,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            height: 400,
            donut_inner_size: "50%".to_string(),
            pie_label_format: "<b>{point.name}</b>: {point.percentage:.1f} %".to_string(),
            show_credits: false,
        }
    }
}

impl RenderDefaults {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.height == 0 {
            return Err(utils::invalid_render("height", 0));
        }
        let inner = self
            .donut_inner_size
            .strip_suffix('%')
            .and_then(|pct| pct.trim().parse::<f64>().ok());
        if !inner.is_some_and(|pct| (0.0..100.0).contains(&pct)) {
            return Err(utils::invalid_render(
                "donut_inner_size",
                &self.donut_inner_size,
            ));
        }
        Ok(())
    }
}

/// `"<measure> by <dimension>"` when both exist, else the first column's
/// name, else the chart type's display name.
pub fn derive_title(insights: &DataInsights, chart_type: ChartType) -> String {
    match (insights.first_measure(), insights.first_dimension()) {
        (Some(measure), Some(dimension)) => format!("{} by {}", measure.name, dimension.name),
        _ => insights
            .columns
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| chart_type.display_title()),
    }
}

fn highcharts_type(chart_type: ChartType) -> &'static str {
    match chart_type {
        ChartType::Pie | ChartType::Donut => "pie",
        other => other.as_str(),
    }
}

/// Highcharts options skeleton for a chart type, populated with the
/// transformed data.
pub fn build_render_options(
    chart_type: ChartType,
    title: &str,
    data: &TransformedChartData,
    insights: &DataInsights,
    defaults: &RenderDefaults,
) -> Value {
    let mut options = json!({
        "chart": { "type": highcharts_type(chart_type), "height": defaults.height },
        "title": { "text": title },
        "credits": { "enabled": defaults.show_credits },
        "series": data.series,
    });
    let extra = match chart_type {
        ChartType::Bar | ChartType::Column | ChartType::Line | ChartType::Area => {
            let x_title = insights.first_dimension().map_or("Category", |d| d.name.as_str());
            let y_title = insights.first_measure().map_or("Value", |m| m.name.as_str());
            json!({
                "xAxis": {
                    "categories": data.categories.clone().unwrap_or_default(),
                    "title": { "text": x_title },
                },
                "yAxis": { "title": { "text": y_title } },
                "legend": { "enabled": data.series.len() > 1 },
            })
        }
        ChartType::Pie | ChartType::Donut => {
            let mut pie = json!({
                "allowPointSelect": true,
                "cursor": "pointer",
                "dataLabels": { "enabled": true, "format": defaults.pie_label_format },
            });
            if chart_type == ChartType::Donut {
                pie["innerSize"] = json!(defaults.donut_inner_size);
            }
            json!({
                "tooltip": { "pointFormat": "{series.name}: <b>{point.y}</b>" },
                "plotOptions": { "pie": pie },
            })
        }
        ChartType::Scatter => {
            let mut measures = insights.measures();
            let x_title = measures.next().map_or("X", |m| m.name.as_str());
            let y_title = measures.next().map_or("Y", |m| m.name.as_str());
            json!({
                "xAxis": { "title": { "text": x_title } },
                "yAxis": { "title": { "text": y_title } },
                "tooltip": { "pointFormat": "{point.x}, {point.y}" },
                "plotOptions": { "scatter": { "marker": { "radius": 5 } } },
            })
        }
    };
    if let (Some(target), Value::Object(extra)) = (options.as_object_mut(), extra) {
        target.extend(extra);
    }
    options
}

/// Layers an author-supplied options object over the skeleton, then puts the
/// real data back: `series` is replaced and `xAxis.categories` is replaced
/// when the chart has categories and removed when it has none. `chart.type`
/// and the donut `innerSize` from the skeleton are restored if the author's
/// keys dropped them. Everything else the author wrote is kept.
pub fn merge_author_options(
    chart_type: ChartType,
    skeleton: Value,
    author: &Map<String, Value>,
    data: &TransformedChartData,
) -> Value {
    let inner_size = skeleton.pointer("/plotOptions/pie/innerSize").cloned();
    let mut merged = match skeleton {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in author {
        merged.insert(key.clone(), value.clone());
    }
    merged.insert("series".to_string(), json!(data.series));
    let mut merged = Value::Object(merged);

    if !merged["chart"].is_object() {
        merged["chart"] = json!({});
    }
    merged["chart"]["type"] = json!(highcharts_type(chart_type));

    if let Some(inner_size) = inner_size {
        if !merged["plotOptions"].is_object() {
            merged["plotOptions"] = json!({});
        }
        let pie = &mut merged["plotOptions"]["pie"];
        if !pie.is_object() {
            *pie = json!({});
        }
        if pie.get("innerSize").is_none() {
            pie["innerSize"] = inner_size;
        }
    }

    if let Some(categories) = &data.categories {
        // Highcharts allows a list of axes; the first one carries categories.
        let target = match &mut merged["xAxis"] {
            Value::Array(axes) => axes.first_mut(),
            other => Some(other),
        };
        if let Some(target) = target {
            if !target.is_object() {
                *target = json!({});
            }
            target["categories"] = json!(categories);
        }
    } else if let Some(axis) = merged.get_mut("xAxis") {
        let axes = match axis {
            Value::Array(axes) => axes.as_mut_slice(),
            other => std::slice::from_mut(other),
        };
        for axis in axes.iter_mut().filter_map(Value::as_object_mut) {
            axis.remove("categories");
        }
    }
    merged
}

/// Turns model output or a heuristic suggestion into a renderable chart,
/// always built from the live dataset.
pub struct ChartConfigGenerator<'a> {
    analyzer: DataAnalyzer<'a>,
    transform: TransformConfig,
    render: RenderDefaults,
}

impl<'a> ChartConfigGenerator<'a> {
    pub fn new(data: &'a TabularResult) -> Self {
        Self::with_analyzer(
            DataAnalyzer::new(data),
            TransformConfig::default(),
            RenderDefaults::default(),
        )
    }

    pub fn with_analyzer(
        analyzer: DataAnalyzer<'a>,
        transform: TransformConfig,
        render: RenderDefaults,
    ) -> Self {
        Self {
            analyzer,
            transform,
            render,
        }
    }

    pub fn analyzer(&self) -> &DataAnalyzer<'a> {
        &self.analyzer
    }

    pub fn insights(&self) -> &DataInsights {
        self.analyzer.analyze()
    }

    /// Uses the model's specification when one can be parsed, otherwise the
    /// top heuristic suggestion. `None` only when there is no suggestion.
    pub fn generate_from_specification(&self, raw_text: &str) -> Option<ChartConfiguration> {
        match extract_specification(raw_text) {
            Some(spec) => Some(self.configuration_from_spec(&spec)),
            None => {
                warn!("Model output had no usable chart specification, using top suggestion");
                self.generate_fallback()
            }
        }
    }

    pub fn generate_fallback(&self) -> Option<ChartConfiguration> {
        let suggestion = self.insights().top_suggestion()?.clone();
        info!(
            chart = %suggestion.chart_type,
            confidence = suggestion.confidence,
            "Building chart from top suggestion"
        );
        Some(self.build(
            suggestion.chart_type,
            suggestion.reasoning,
            suggestion.confidence,
            None,
        ))
    }

    fn configuration_from_spec(&self, spec: &ModelSpecification) -> ChartConfiguration {
        let chart_type = ChartType::from_name_or_default(&spec.chart_type);
        info!(
            requested = %spec.chart_type,
            chart = %chart_type,
            "Building chart from model specification"
        );
        let author = spec.highcharts_config.as_ref().and_then(Value::as_object);
        self.build(
            chart_type,
            spec.explanation.clone().unwrap_or_default(),
            spec.confidence
                .map_or(DEFAULT_MODEL_CONFIDENCE, |c| c.clamp(0.0, 1.0)),
            author,
        )
    }

    fn build(
        &self,
        chart_type: ChartType,
        explanation: String,
        confidence: f64,
        author: Option<&Map<String, Value>>,
    ) -> ChartConfiguration {
        let insights = self.insights();
        let data = transform_for_chart(chart_type, self.analyzer.data(), insights, &self.transform);
        let title = derive_title(insights, chart_type);
        let skeleton = build_render_options(chart_type, &title, &data, insights, &self.render);
        let render_options = match author {
            Some(author) => merge_author_options(chart_type, skeleton, author, &data),
            None => skeleton,
        };
        ChartConfiguration {
            chart_type,
            title,
            explanation,
            confidence,
            render_options,
        }
    }
}
