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

use crate::chart_suggester::{self, ChartSuggestion};
use crate::chart_type::ChartType;
use crate::error::{utils, ConfigResult};
use crate::tabular::{coerce_number, value_text, TabularResult};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::OnceCell;
use tracing::{debug, info};

const TIME_KEYWORDS: [&str; 8] = [
    "date",
    "time",
    "year",
    "month",
    "day",
    "created",
    "updated",
    "timestamp",
];

static DATE_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{4}$)").expect("date pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Share of a column's values that must coerce to numbers before the
    /// column counts as numeric. Strictly-greater comparison.
    pub numeric_share_threshold: f64,
    /// A numeric column needs more distinct values than this to be a measure.
    pub measure_min_unique_values: usize,
    pub max_sample_values: usize,
    pub max_suggestions: usize,
    /// Row count and category count ceiling for pie/donut suggestions.
    pub pie_max_categories: usize,
    pub complexity: ComplexityLimits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityLimits {
    pub simple_max_columns: usize,
    pub simple_max_rows: usize,
    pub moderate_max_columns: usize,
    pub moderate_max_rows: usize,
    pub moderate_max_measures: usize,
}

impl Default for ComplexityLimits {
    fn default() -> Self {
        Self {
            simple_max_columns: 2,
            simple_max_rows: 50,
            moderate_max_columns: 5,
            moderate_max_rows: 1000,
            moderate_max_measures: 3,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            numeric_share_threshold: 0.7,
            measure_min_unique_values: 10,
            max_sample_values: 5,
            max_suggestions: 3,
            pie_max_categories: 7,
            complexity: ComplexityLimits::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.numeric_share_threshold > 0.0 && self.numeric_share_threshold < 1.0) {
            return Err(utils::invalid_analysis(
                "numeric_share_threshold",
                self.numeric_share_threshold,
            ));
        }
        if self.max_sample_values == 0 {
            return Err(utils::invalid_analysis("max_sample_values", 0));
        }
        if self.max_suggestions == 0 {
            return Err(utils::invalid_analysis("max_suggestions", 0));
        }
        if self.pie_max_categories == 0 {
            return Err(utils::invalid_analysis("pie_max_categories", 0));
        }
        let limits = &self.complexity;
        if limits.simple_max_columns > limits.moderate_max_columns {
            return Err(utils::invalid_analysis(
                "complexity.simple_max_columns",
                limits.simple_max_columns,
            ));
        }
        if limits.simple_max_rows > limits.moderate_max_rows {
            return Err(utils::invalid_analysis(
                "complexity.simple_max_rows",
                limits.simple_max_rows,
            ));
        }
        Ok(())
    }

    /// Keeps every matching suggestion instead of the top three.
    pub fn for_exploration() -> Self {
        Self {
            max_suggestions: ChartType::ALL.len(),
            max_sample_values: 10,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizedType {
    String,
    Number,
    Date,
    Boolean,
    Unknown,
}

impl NormalizedType {
    /// Case-insensitive substring match on the source system's type name.
    pub fn from_declared(declared: &str) -> Self {
        let lowered = declared.to_lowercase();
        let has_any = |needles: &[&str]| needles.iter().any(|n| lowered.contains(n));
        if has_any(&["string", "text", "varchar"]) {
            NormalizedType::String
        } else if has_any(&["number", "int", "decimal", "float"]) {
            NormalizedType::Number
        } else if has_any(&["date", "time", "timestamp"]) {
            NormalizedType::Date
        } else if has_any(&["bool"]) {
            NormalizedType::Boolean
        } else {
            NormalizedType::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: String,
    pub position: usize,
    pub declared_type: String,
    pub normalized_type: NormalizedType,
    pub is_measure: bool,
    pub is_dimension: bool,
    pub unique_value_count: usize,
    pub sample_values: Vec<Value>,
    pub has_numeric_values: bool,
    pub is_time_related: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataComplexity {
    Simple,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataInsights {
    pub total_rows: usize,
    pub is_aggregated: bool,
    pub is_sampled: bool,
    pub columns: Vec<ColumnProfile>,
    pub has_time_column: bool,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub data_complexity: DataComplexity,
    pub suggested_charts: Vec<ChartSuggestion>,
}

impl DataInsights {
    pub fn first_dimension(&self) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.is_dimension)
    }

    pub fn first_measure(&self) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.is_measure)
    }

    pub fn measures(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().filter(|c| c.is_measure)
    }

    pub fn measure_count(&self) -> usize {
        self.measures().count()
    }

    pub fn top_suggestion(&self) -> Option<&ChartSuggestion> {
        self.suggested_charts.first()
    }

    pub fn profile(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Profiles one dataset and caches the result for the analyzer's lifetime.
pub struct DataAnalyzer<'a> {
    data: &'a TabularResult,
    config: AnalysisConfig,
    insights: OnceCell<DataInsights>,
}

impl<'a> DataAnalyzer<'a> {
    pub fn new(data: &'a TabularResult) -> Self {
        Self::with_config(data, AnalysisConfig::default())
    }

    pub fn with_config(data: &'a TabularResult, config: AnalysisConfig) -> Self {
        Self {
            data,
            config,
            insights: OnceCell::new(),
        }
    }

    pub fn data(&self) -> &'a TabularResult {
        self.data
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Computes insights on first call; later calls return the cached value.
    pub fn analyze(&self) -> &DataInsights {
        self.insights.get_or_init(|| analyze(self.data, &self.config))
    }

    /// Points the analyzer at new input and drops the cached insights.
    pub fn reanalyze(&mut self, data: &'a TabularResult) -> &DataInsights {
        self.data = data;
        self.insights = OnceCell::new();
        self.analyze()
    }

    pub fn is_analyzed(&self) -> bool {
        self.insights.get().is_some()
    }
}

/// Uncached analysis of one dataset. Never fails: empty input yields no
/// column profiles and no suggestions.
pub fn analyze(data: &TabularResult, config: &AnalysisConfig) -> DataInsights {
    let columns: Vec<ColumnProfile> = if data.is_empty() {
        Vec::new()
    } else {
        (0..data.columns.len())
            .map(|position| profile_column(data, position, config))
            .collect()
    };

    let has_time_column = columns
        .iter()
        .any(|c| c.is_time_related || c.normalized_type == NormalizedType::Date);
    let numeric_columns: Vec<String> = columns
        .iter()
        .filter(|c| c.has_numeric_values)
        .map(|c| c.name.clone())
        .collect();
    let categorical_columns: Vec<String> = columns
        .iter()
        .filter(|c| c.normalized_type == NormalizedType::String)
        .map(|c| c.name.clone())
        .collect();
    let measure_count = columns.iter().filter(|c| c.is_measure).count();
    let data_complexity = classify_complexity(
        columns.len(),
        data.total_rows,
        measure_count,
        &config.complexity,
    );

    let mut insights = DataInsights {
        total_rows: data.total_rows,
        is_aggregated: data.is_aggregated,
        is_sampled: data.is_sampled,
        columns,
        has_time_column,
        numeric_columns,
        categorical_columns,
        data_complexity,
        suggested_charts: Vec::new(),
    };
    insights.suggested_charts = chart_suggester::suggest_charts(&insights, config);

    info!(
        columns = insights.columns.len(),
        rows = insights.total_rows,
        complexity = ?insights.data_complexity,
        suggestions = insights.suggested_charts.len(),
        "Analysed tabular result"
    );
    insights
}

fn profile_column(data: &TabularResult, position: usize, config: &AnalysisConfig) -> ColumnProfile {
    let header = &data.columns[position];
    let values: Vec<&Value> = data.column_values(position).collect();

    // Insertion order doubles as first-seen order for samples. Keys are the
    // JSON text so that 1 and "1" stay distinct.
    let mut distinct: IndexMap<String, &Value> = IndexMap::new();
    for value in &values {
        distinct.entry(value.to_string()).or_insert(*value);
    }
    let unique_value_count = distinct.len();
    let sample_values: Vec<Value> = distinct
        .values()
        .take(config.max_sample_values)
        .map(|v| (*v).clone())
        .collect();

    let has_numeric_values = if values.is_empty() {
        false
    } else {
        let numeric = values.iter().filter(|v| coerce_number(v).is_some()).count();
        numeric as f64 / values.len() as f64 > config.numeric_share_threshold
    };

    let normalized_type = NormalizedType::from_declared(&header.declared_type);
    let is_measure = has_numeric_values && unique_value_count > config.measure_min_unique_values;
    let is_time_related = is_time_related(&header.label, &sample_values);

    let profile = ColumnProfile {
        name: header.label.clone(),
        position,
        declared_type: header.declared_type.clone(),
        normalized_type,
        is_measure,
        is_dimension: !is_measure,
        unique_value_count,
        sample_values,
        has_numeric_values,
        is_time_related,
    };
    debug!(
        column = %profile.name,
        normalized = ?profile.normalized_type,
        measure = profile.is_measure,
        unique = profile.unique_value_count,
        time = profile.is_time_related,
        "Profiled column"
    );
    profile
}

fn is_time_related(label: &str, samples: &[Value]) -> bool {
    let lowered = label.to_lowercase();
    if TIME_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return true;
    }
    samples
        .iter()
        .any(|v| !v.is_null() && DATE_LIKE.is_match(&value_text(v)))
}

fn classify_complexity(
    columns: usize,
    rows: usize,
    measures: usize,
    limits: &ComplexityLimits,
) -> DataComplexity {
    if columns <= limits.simple_max_columns && rows <= limits.simple_max_rows {
        DataComplexity::Simple
    } else if columns <= limits.moderate_max_columns
        && rows <= limits.moderate_max_rows
        && measures <= limits.moderate_max_measures
    {
        DataComplexity::Moderate
    } else {
        DataComplexity::Complex
    }
}
