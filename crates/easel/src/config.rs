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

use crate::chart_config::RenderDefaults;
use crate::chart_transformer::TransformConfig;
use crate::data_analyzer::AnalysisConfig;
use crate::error::{utils, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Every tunable in one place. Missing YAML sections fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EaselConfig {
    pub analysis: AnalysisConfig,
    pub transform: TransformConfig,
    pub render: RenderDefaults,
}

impl EaselConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| utils::file_error(&path.display().to_string(), e))?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.render.validate()?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
