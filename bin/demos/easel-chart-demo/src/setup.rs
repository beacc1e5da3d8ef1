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

use anyhow::{Context, Result};
use async_trait::async_trait;
use easel::error::ModelResult;
use easel::{ChartModel, EaselConfig, ModelError, TabularResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logs go to stderr so stdout stays clean JSON. `RUST_LOG` wins over the flag.
pub fn setup_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(env_filter),
        )
        .init();
}

pub fn load_table(path: &Path) -> Result<TabularResult> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let loaded = if is_csv {
        TabularResult::from_csv_reader(file)
    } else {
        TabularResult::from_json_reader(file)
    };
    let table = loaded.with_context(|| format!("reading {}", path.display()))?;
    info!(
        path = %path.display(),
        columns = table.columns.len(),
        rows = table.rows.len(),
        "Loaded query result"
    );
    Ok(table)
}

pub fn load_config(path: Option<&Path>) -> Result<EaselConfig> {
    match path {
        Some(path) => EaselConfig::from_yaml_file(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(EaselConfig::default()),
    }
}

/// Replays a saved model reply, so the full request path runs offline.
pub struct ReplayModel {
    path: PathBuf,
}

impl ReplayModel {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ChartModel for ReplayModel {
    async fn complete(&self, prompt: &str) -> ModelResult<String> {
        info!(prompt_chars = prompt.len(), reply = %self.path.display(), "Replaying model reply");
        let reply = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ModelError::RequestFailed(format!("{}: {e}", self.path.display())))?;
        if reply.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(reply)
    }
}
