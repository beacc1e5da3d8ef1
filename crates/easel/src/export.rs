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

//! Wire types for the component export service. Building and packaging the
//! component happens on the service side.

use crate::chart_config::ChartConfiguration;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportChartConfig {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub title: String,
    pub explanation: String,
    pub confidence: f64,
    pub highcharts_config: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub project_name: String,
    pub chart_config: ExportChartConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ChartConfiguration> for ExportChartConfig {
    fn from(config: &ChartConfiguration) -> Self {
        Self {
            chart_type: config.chart_type.to_string(),
            title: config.title.clone(),
            explanation: config.explanation.clone(),
            confidence: config.confidence,
            highcharts_config: config.render_options.clone(),
        }
    }
}

/// Project names end up as directory and file names on the service.
fn validate_project_name(name: &str) -> ConfigResult<()> {
    let invalid = |reason: &str| ConfigError::InvalidProjectName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.starts_with('-') {
        return Err(invalid("name starts with '-'"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(invalid(&format!("character '{bad}' is not allowed")));
    }
    Ok(())
}

impl ExportRequest {
    pub fn new(project_name: &str, config: &ChartConfiguration) -> ConfigResult<Self> {
        validate_project_name(project_name)?;
        Ok(Self {
            project_name: project_name.to_string(),
            chart_config: ExportChartConfig::from(config),
        })
    }
}

impl ExportResponse {
    /// Download location on success, error text otherwise.
    pub fn into_result(self) -> Result<String, String> {
        match (self.success, self.download_url, self.error) {
            (true, Some(url), _) => Ok(url),
            (true, None, _) => Err("export succeeded without a download location".to_string()),
            (false, _, Some(error)) => Err(error),
            (false, _, None) => Err("export failed".to_string()),
        }
    }
}
