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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartAssistantError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to parse tabular result: {source}")]
    TabularParse {
        #[from]
        source: serde_json::Error,
    },
    #[error("Failed to read CSV input: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
    #[error("CSV input has no header row")]
    MissingHeader,
    #[error("Row {row} has {found} cells but only {expected} columns are declared")]
    RowTooWide {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid analysis configuration: {field} = {value}")]
    InvalidAnalysisConfig { field: String, value: String },
    #[error("Invalid render defaults: {field} = {value}")]
    InvalidRenderDefaults { field: String, value: String },
    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    RequestFailed(String),
    #[error("Model returned an empty response")]
    EmptyResponse,
    #[error("Model request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("YAML serialisation failed: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, ChartAssistantError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type ModelResult<T> = std::result::Result<T, ModelError>;

impl From<serde_json::Error> for ChartAssistantError {
    fn from(err: serde_json::Error) -> Self {
        ChartAssistantError::Serialisation(SerialisationError::Json { source: err })
    }
}

impl From<serde_yaml::Error> for ChartAssistantError {
    fn from(err: serde_yaml::Error) -> Self {
        ChartAssistantError::Serialisation(SerialisationError::Yaml { source: err })
    }
}

impl ChartAssistantError {
    /// Model failures are absorbed by the fallback path; everything else
    /// means the caller handed over unusable input or settings.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ChartAssistantError::Model(_))
    }

    pub fn category(&self) -> &'static str {
        match self {
            ChartAssistantError::Data(_) => "Data",
            ChartAssistantError::Config(_) => "Configuration",
            ChartAssistantError::Model(_) => "Model",
            ChartAssistantError::Serialisation(_) => "Serialisation",
            ChartAssistantError::Io(_) => "I/O",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ChartAssistantError::Data(DataError::MissingHeader) => {
                "The CSV file needs a header row naming each column.".to_string()
            }
            ChartAssistantError::Data(DataError::TabularParse { .. }) => {
                "The data could not be read. Check that it is a valid query result.".to_string()
            }
            ChartAssistantError::Config(ConfigError::InvalidProjectName { name, .. }) => {
                format!(
                    "'{name}' cannot be used as a project name. \
                     Use letters, digits, '-' or '_'."
                )
            }
            ChartAssistantError::Model(_) => {
                "The assistant could not be reached; showing a suggested chart instead.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

pub mod utils {
    use super::*;

    pub fn invalid_analysis(field: &str, value: impl ToString) -> ConfigError {
        ConfigError::InvalidAnalysisConfig {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn invalid_render(field: &str, value: impl ToString) -> ConfigError {
        ConfigError::InvalidRenderDefaults {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn file_error(path: &str, source: std::io::Error) -> ConfigError {
        ConfigError::ConfigFileError {
            path: path.to_string(),
            source,
        }
    }
}
