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

use crate::error::ModelResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Anything that turns a prompt into free text, typically a hosted language
/// model. Timeouts and cancellation are the implementor's concern.
#[async_trait]
pub trait ChartModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> ModelResult<String>;
}

/// The JSON object a model is asked to embed in its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpecification {
    pub chart_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highcharts_config: Option<Value>,
}

/// Greedy search: everything from the first `{` to the last `}`.
fn find_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Pulls a chart specification out of model output. Returns `None` when no
/// object parses or when the object has no string `chartType`. Optional
/// fields with the wrong JSON type are dropped rather than failing the parse.
pub fn extract_specification(text: &str) -> Option<ModelSpecification> {
    let Some(candidate) = find_object_span(text) else {
        debug!("No JSON object found in model output");
        return None;
    };
    let parsed: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            warn!("Found JSON-like substring in model output, but it failed to parse: {e}");
            return None;
        }
    };
    let object = parsed.as_object()?;
    let Some(chart_type) = object.get("chartType").and_then(Value::as_str) else {
        warn!("Model output JSON has no chartType field");
        return None;
    };
    Some(ModelSpecification {
        chart_type: chart_type.to_string(),
        confidence: object.get("confidence").and_then(Value::as_f64),
        explanation: object
            .get("explanation")
            .and_then(Value::as_str)
            .map(str::to_string),
        highcharts_config: object
            .get("highchartsConfig")
            .filter(|v| v.is_object())
            .cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_runs_from_first_open_to_last_close() {
        assert_eq!(find_object_span("a {x} b {y} c"), Some("{x} b {y}"));
        assert_eq!(find_object_span("} nothing {"), None);
        assert_eq!(find_object_span("no braces"), None);
    }
}
