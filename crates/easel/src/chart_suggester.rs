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

//! Rule-based chart suggestions.
//!
//! Every rule is checked independently against the dataset shape and all
//! matches are collected before ranking. Ranking orders by priority first
//! (1 is most important) and only uses confidence to break ties inside a
//! priority tier.

use crate::chart_type::ChartType;
use crate::data_analyzer::{AnalysisConfig, DataInsights};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSuggestion {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub confidence: f64,
    pub reasoning: String,
    pub priority: u8,
}

mod rule_weights {
    pub const TEMPORAL_LINE: (f64, u8) = (0.90, 1);
    pub const TEMPORAL_AREA: (f64, u8) = (0.70, 3);
    pub const CATEGORY_COLUMN: (f64, u8) = (0.85, 1);
    pub const CATEGORY_BAR: (f64, u8) = (0.80, 2);
    pub const PROPORTION_PIE: (f64, u8) = (0.75, 2);
    pub const PROPORTION_DONUT: (f64, u8) = (0.70, 3);
    pub const CORRELATION_SCATTER: (f64, u8) = (0.60, 4);
    pub const MULTI_MEASURE_COLUMN: (f64, u8) = (0.60, 3);
}

impl ChartSuggestion {
    fn from_rule(chart_type: ChartType, weight: (f64, u8), reasoning: &str) -> Self {
        Self {
            chart_type,
            confidence: weight.0,
            reasoning: reasoning.to_string(),
            priority: weight.1,
        }
    }
}

/// Ranked and truncated suggestions for a profiled dataset.
pub fn suggest_charts(insights: &DataInsights, config: &AnalysisConfig) -> Vec<ChartSuggestion> {
    let mut suggestions = matching_suggestions(insights, config);
    rank_suggestions(&mut suggestions);
    suggestions.truncate(config.max_suggestions);
    suggestions
}

/// Every suggestion whose rule matches, in rule order and unranked.
pub fn matching_suggestions(
    insights: &DataInsights,
    config: &AnalysisConfig,
) -> Vec<ChartSuggestion> {
    if insights.columns.is_empty() {
        return Vec::new();
    }

    let numeric_count = insights.numeric_columns.len();
    let categorical_count = insights.categorical_columns.len();
    let mut suggestions = Vec::new();

    if insights.has_time_column && numeric_count >= 1 {
        suggestions.push(ChartSuggestion::from_rule(
            ChartType::Line,
            rule_weights::TEMPORAL_LINE,
            "Time-based data is best shown as a trend over time",
        ));
        suggestions.push(ChartSuggestion::from_rule(
            ChartType::Area,
            rule_weights::TEMPORAL_AREA,
            "An area chart emphasises the volume of change over time",
        ));
    }

    let single_pairing = categorical_count == 1 && numeric_count == 1;
    if single_pairing {
        suggestions.push(ChartSuggestion::from_rule(
            ChartType::Column,
            rule_weights::CATEGORY_COLUMN,
            "One category and one value compare well side by side as columns",
        ));
        suggestions.push(ChartSuggestion::from_rule(
            ChartType::Bar,
            rule_weights::CATEGORY_BAR,
            "Horizontal bars suit category comparisons with longer labels",
        ));

        let few_categories = insights
            .profile(&insights.categorical_columns[0])
            .is_some_and(|p| p.unique_value_count <= config.pie_max_categories);
        if insights.total_rows <= config.pie_max_categories && few_categories {
            suggestions.push(ChartSuggestion::from_rule(
                ChartType::Pie,
                rule_weights::PROPORTION_PIE,
                "A small number of categories can be shown as parts of a whole",
            ));
            suggestions.push(ChartSuggestion::from_rule(
                ChartType::Donut,
                rule_weights::PROPORTION_DONUT,
                "A donut shows the same proportions with room for a central label",
            ));
        }
    }

    if numeric_count >= 2 {
        suggestions.push(ChartSuggestion::from_rule(
            ChartType::Scatter,
            rule_weights::CORRELATION_SCATTER,
            "Two numeric columns can reveal a correlation when plotted against each other",
        ));
    }

    if numeric_count > 1 {
        suggestions.push(ChartSuggestion::from_rule(
            ChartType::Column,
            rule_weights::MULTI_MEASURE_COLUMN,
            "Several numeric columns can be compared as grouped columns",
        ));
    }

    debug!(
        matched = suggestions.len(),
        numeric = numeric_count,
        categorical = categorical_count,
        "Evaluated chart suggestion rules"
    );
    suggestions
}

/// Ascending priority, then descending confidence. Stable, so rule order
/// decides exact ties.
pub fn rank_suggestions(suggestions: &mut [ChartSuggestion]) {
    suggestions.sort_by(|a, b| {
        a.priority.cmp(&b.priority).then_with(|| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(chart_type: ChartType, confidence: f64, priority: u8) -> ChartSuggestion {
        ChartSuggestion {
            chart_type,
            confidence,
            reasoning: String::new(),
            priority,
        }
    }

    #[test]
    fn priority_dominates_confidence() {
        let mut ranked = vec![
            suggestion(ChartType::Scatter, 0.99, 4),
            suggestion(ChartType::Bar, 0.10, 1),
            suggestion(ChartType::Pie, 0.75, 2),
            suggestion(ChartType::Line, 0.90, 1),
        ];
        rank_suggestions(&mut ranked);
        let order: Vec<ChartType> = ranked.iter().map(|s| s.chart_type).collect();
        assert_eq!(
            order,
            vec![ChartType::Line, ChartType::Bar, ChartType::Pie, ChartType::Scatter]
        );
    }
}
