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

use crate::chart_type::ChartType;
use crate::data_analyzer::{ColumnProfile, DataInsights};
use crate::tabular::{value_text, TabularResult};
use std::fmt::Write;

pub const PROMPT_SAMPLE_ROWS: usize = 5;

fn describe_column(profile: &ColumnProfile) -> String {
    let role = if profile.is_measure { "measure" } else { "dimension" };
    let samples: Vec<String> = profile.sample_values.iter().map(value_text).collect();
    let mut line = format!(
        "- {} ({:?}, {role}, {} distinct)",
        profile.name, profile.normalized_type, profile.unique_value_count
    );
    if profile.is_time_related {
        line.push_str(", time-related");
    }
    if !samples.is_empty() {
        let _ = write!(line, ", e.g. {}", samples.join(", "));
    }
    line
}

/// Prompt asking the model for one JSON chart specification, grounded in the
/// profiled columns and the heuristic suggestions.
pub fn build_prompt(request: &str, data: &TabularResult, insights: &DataInsights) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are a data visualisation assistant that designs Highcharts charts.\n\n");
    let _ = writeln!(prompt, "User request: {}\n", request.trim());

    prompt.push_str("Dataset\n=======\n");
    let _ = writeln!(prompt, "Rows: {}", insights.total_rows);
    let _ = writeln!(prompt, "Aggregated: {}", insights.is_aggregated);
    let _ = writeln!(prompt, "Sampled: {}", insights.is_sampled);
    let _ = writeln!(prompt, "Complexity: {:?}", insights.data_complexity);
    let _ = writeln!(prompt, "Has time column: {}", insights.has_time_column);

    prompt.push_str("\nColumns:\n");
    for profile in &insights.columns {
        prompt.push_str(&describe_column(profile));
        prompt.push('\n');
    }

    if !insights.suggested_charts.is_empty() {
        prompt.push_str("\nSuggested charts:\n");
        for suggestion in &insights.suggested_charts {
            let _ = writeln!(
                prompt,
                "- {} (confidence {:.2}): {}",
                suggestion.chart_type, suggestion.confidence, suggestion.reasoning
            );
        }
    }

    let sample = data.sample(PROMPT_SAMPLE_ROWS);
    if !sample.is_empty() {
        prompt.push_str("\nSample rows:\n");
        for row in sample {
            let cells: Vec<String> = row.iter().map(|cell| cell.label()).collect();
            let _ = writeln!(prompt, "- {}", cells.join(" | "));
        }
    }

    let allowed: Vec<&str> = ChartType::ALL.iter().map(ChartType::as_str).collect();
    prompt.push_str("\nRespond with a short explanation followed by one JSON object:\n");
    prompt.push_str(
        "{\"chartType\": string, \"confidence\": number between 0 and 1, \
         \"explanation\": string, \"highchartsConfig\": object}\n",
    );
    let _ = writeln!(prompt, "chartType must be one of: {}.", allowed.join(", "));
    prompt.push_str(
        "Placeholder series and categories in highchartsConfig are replaced with the real data.\n",
    );
    prompt
}
