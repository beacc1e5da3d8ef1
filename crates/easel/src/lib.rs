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

pub mod chart_config;
pub mod chart_suggester;
pub mod chart_transformer;
pub mod chart_type;
pub mod config;
pub mod data_analyzer;
pub mod error;
pub mod export;
pub mod model;
pub mod prompt;
pub mod tabular;

pub use chart_config::{ChartConfigGenerator, ChartConfiguration, RenderDefaults};
pub use chart_suggester::ChartSuggestion;
pub use chart_transformer::{
    DataPoint, DuplicateCategoryPolicy, ScatterColumns, Series, TransformConfig,
    TransformedChartData,
};
pub use chart_type::ChartType;
pub use config::EaselConfig;
pub use data_analyzer::{
    AnalysisConfig, ColumnProfile, DataAnalyzer, DataComplexity, DataInsights, NormalizedType,
};
pub use error::{ChartAssistantError, ConfigError, DataError, ModelError, Result};
pub use export::{ExportRequest, ExportResponse};
pub use model::{ChartModel, ModelSpecification};
pub use tabular::{Cell, ColumnHeader, TabularResult};

use tracing::warn;

/// Runs the whole pipeline for one dataset at a time: analysis, prompt,
/// model call, and chart configuration with fallback.
pub struct ChartAssistant {
    config: EaselConfig,
}

impl ChartAssistant {
    pub fn new() -> Self {
        Self {
            config: EaselConfig::default(),
        }
    }

    pub fn with_config(config: EaselConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EaselConfig {
        &self.config
    }

    pub fn generator<'a>(&self, data: &'a TabularResult) -> ChartConfigGenerator<'a> {
        ChartConfigGenerator::with_analyzer(
            DataAnalyzer::with_config(data, self.config.analysis.clone()),
            self.config.transform.clone(),
            self.config.render.clone(),
        )
    }

    pub fn analyze(&self, data: &TabularResult) -> DataInsights {
        data_analyzer::analyze(data, &self.config.analysis)
    }

    pub fn suggest(&self, data: &TabularResult) -> Vec<ChartSuggestion> {
        self.analyze(data).suggested_charts
    }

    pub fn transform(&self, chart_type: ChartType, data: &TabularResult) -> TransformedChartData {
        let insights = self.analyze(data);
        chart_transformer::transform_for_chart(chart_type, data, &insights, &self.config.transform)
    }

    pub fn prompt_for(&self, request: &str, data: &TabularResult) -> String {
        prompt::build_prompt(request, data, &self.analyze(data))
    }

    /// Chart for model output that has already been received.
    pub fn respond_with(
        &self,
        model_output: &str,
        data: &TabularResult,
    ) -> Option<ChartConfiguration> {
        self.generator(data).generate_from_specification(model_output)
    }

    pub fn fallback(&self, data: &TabularResult) -> Option<ChartConfiguration> {
        self.generator(data).generate_fallback()
    }

    /// Asks the model for a chart. A failed model call is logged and
    /// answered with the top heuristic suggestion.
    pub async fn respond<M: ChartModel + ?Sized>(
        &self,
        request: &str,
        data: &TabularResult,
        model: &M,
    ) -> Option<ChartConfiguration> {
        let generator = self.generator(data);
        let prompt = prompt::build_prompt(request, data, generator.insights());
        match model.complete(&prompt).await {
            Ok(output) => generator.generate_from_specification(&output),
            Err(e) => {
                warn!(error = %e, "Model call failed, using top suggestion");
                generator.generate_fallback()
            }
        }
    }
}

impl Default for ChartAssistant {
    fn default() -> Self {
        Self::new()
    }
}
