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

use async_trait::async_trait;
use easel::error::ModelResult;
use easel::{
    ChartAssistant, ChartAssistantError, ChartModel, ChartType, ConfigError, DataError,
    DuplicateCategoryPolicy, EaselConfig, ExportRequest, ExportResponse, ModelError,
    TabularResult,
};
use serde_json::json;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

const MONTHLY_REVENUE: &str = r#"{
    "totalRows": 12,
    "isAggregated": true,
    "columns": [
        {"label": "Month", "dataType": "DATE", "id": "m"},
        {"label": "Revenue", "dataType": "DECIMAL", "id": "r"}
    ],
    "rows": [
        [{"value": "2024-01-01", "formatted": "Jan 2024"}, {"value": 1010.5}],
        [{"value": "2024-02-01", "formatted": "Feb 2024"}, {"value": 1120.0}],
        [{"value": "2024-03-01", "formatted": "Mar 2024"}, {"value": 990.25}],
        [{"value": "2024-04-01", "formatted": "Apr 2024"}, {"value": 1300}],
        [{"value": "2024-05-01", "formatted": "May 2024"}, {"value": 1275.75}],
        [{"value": "2024-06-01", "formatted": "Jun 2024"}, {"value": 1410}],
        [{"value": "2024-07-01", "formatted": "Jul 2024"}, {"value": 1388.1}],
        [{"value": "2024-08-01", "formatted": "Aug 2024"}, {"value": 1502}],
        [{"value": "2024-09-01", "formatted": "Sep 2024"}, {"value": 1466.4}],
        [{"value": "2024-10-01", "formatted": "Oct 2024"}, {"value": 1599}],
        [{"value": "2024-11-01", "formatted": "Nov 2024"}, {"value": 1620.8}],
        [{"value": "2024-12-01", "formatted": "Dec 2024"}, {"value": 1750}]
    ]
}"#;

fn monthly_revenue() -> TabularResult {
    TabularResult::from_json_str(MONTHLY_REVENUE).unwrap()
}

struct ScriptedModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChartModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> ModelResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

struct UnreachableModel;

#[async_trait]
impl ChartModel for UnreachableModel {
    async fn complete(&self, _prompt: &str) -> ModelResult<String> {
        Err(ModelError::Timeout { seconds: 30 })
    }
}

#[test]
fn test_tabular_json_reads_declared_types() {
    let data = monthly_revenue();
    assert_eq!(data.total_rows, 12);
    assert!(data.is_aggregated);
    assert!(!data.is_sampled);
    assert_eq!(data.columns[0].declared_type, "DATE");
    assert_eq!(data.columns[1].id, "r");
    assert_eq!(data.rows[0][0].label(), "Jan 2024");
    assert_eq!(data.rows[0][1].label(), "1010.5");
    assert_eq!(data.cell(3, 1).and_then(|c| c.as_number()), Some(1300.0));

    let err = TabularResult::from_json_str("{\"columns\": 3}").unwrap_err();
    assert!(matches!(err, DataError::TabularParse { .. }));
}

#[tokio::test]
async fn test_model_specification_drives_chart() {
    let data = monthly_revenue();
    let assistant = ChartAssistant::new();
    let model = ScriptedModel::new(
        r##"Revenue trends are clearest as a line.
        {"chartType": "line", "confidence": 0.95, "explanation": "Monthly trend",
         "highchartsConfig": {"colors": ["#7cb5ec"]}}"##,
    );

    let config = assistant
        .respond("How did revenue develop this year?", &data, &model)
        .await
        .unwrap();
    assert_eq!(config.chart_type, ChartType::Line);
    assert_eq!(config.explanation, "Monthly trend");
    assert_eq!(config.title, "Revenue by Month");
    assert_eq!(config.render_options["colors"], json!(["#7cb5ec"]));
    assert_eq!(config.render_options["xAxis"]["categories"][0], json!("Jan 2024"));
    assert_eq!(config.render_options["series"][0]["data"][11], json!(1750.0));

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("How did revenue develop this year?"));
}

#[tokio::test]
async fn test_model_failure_falls_back_to_suggestion() {
    let data = monthly_revenue();
    let assistant = ChartAssistant::new();

    let config = assistant
        .respond("Show revenue", &data, &UnreachableModel)
        .await
        .unwrap();
    assert_eq!(Some(config.clone()), assistant.fallback(&data));
    assert_eq!(config.chart_type, ChartType::Line);
    assert!((config.confidence - 0.9).abs() < 1e-9);

    let dyn_model: Box<dyn ChartModel> = Box::new(UnreachableModel);
    let boxed = assistant.respond("Show revenue", &data, dyn_model.as_ref()).await;
    assert_eq!(boxed, Some(config));
}

#[tokio::test]
async fn test_prose_only_reply_falls_back() {
    let data = monthly_revenue();
    let assistant = ChartAssistant::new();
    let model = ScriptedModel::new("A line chart would suit this data.");
    let config = assistant.respond("Show revenue", &data, &model).await;
    assert_eq!(config, assistant.fallback(&data));
}

#[test]
fn test_prompt_describes_dataset() {
    let data = monthly_revenue();
    let prompt = ChartAssistant::new().prompt_for("Plot revenue by month", &data);

    assert!(prompt.contains("User request: Plot revenue by month"));
    assert!(prompt.contains("Rows: 12"));
    assert!(prompt.contains("- Month (Date, dimension"));
    assert!(prompt.contains("- Revenue (Number, measure, 12 distinct)"));
    assert!(prompt.contains("- line (confidence 0.90)"));
    assert!(prompt.contains("Jan 2024 | 1010.5"));
    assert!(!prompt.contains("Jun 2024"));
    assert!(prompt.contains("bar, column, line, pie, scatter, area, donut"));
}

#[test]
fn test_facade_matches_module_functions() {
    let data = monthly_revenue();
    let assistant = ChartAssistant::default();
    let suggestions = assistant.suggest(&data);
    assert_eq!(suggestions, assistant.analyze(&data).suggested_charts);
    assert_eq!(suggestions[0].chart_type, ChartType::Line);

    let transformed = assistant.transform(ChartType::Scatter, &data);
    assert!(transformed.is_empty());
    let transformed = assistant.transform(ChartType::Column, &data);
    assert_eq!(transformed.categories.as_ref().map(Vec::len), Some(12));

    let config = assistant
        .respond_with(r#"{"chartType": "area"}"#, &data)
        .unwrap();
    assert_eq!(config.chart_type, ChartType::Area);
}

#[test]
fn test_yaml_configuration_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "analysis:\n  max_suggestions: 5\n\
         transform:\n  duplicate_categories: sum\n\
         render:\n  height: 320"
    )
    .unwrap();

    let config = EaselConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.analysis.max_suggestions, 5);
    assert_eq!(config.analysis.pie_max_categories, 7);
    assert_eq!(config.transform.duplicate_categories, DuplicateCategoryPolicy::Sum);
    assert_eq!(config.render.height, 320);
    assert_eq!(config.render.donut_inner_size, "50%");

    let round_trip = EaselConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
    assert_eq!(round_trip, config);

    let assistant = ChartAssistant::with_config(config).unwrap();
    let fallback = assistant.fallback(&monthly_revenue()).unwrap();
    assert_eq!(fallback.render_options["chart"]["height"], json!(320));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let err =
        EaselConfig::from_yaml_str("analysis:\n  numeric_share_threshold: 1.5\n").unwrap_err();
    assert!(matches!(
        err,
        ChartAssistantError::Config(ConfigError::InvalidAnalysisConfig { ref field, .. })
            if field == "numeric_share_threshold"
    ));
    assert_eq!(err.category(), "Configuration");
    assert!(!err.is_recoverable());

    let err = EaselConfig::from_yaml_str("render:\n  donut_inner_size: wide\n").unwrap_err();
    assert!(matches!(
        err,
        ChartAssistantError::Config(ConfigError::InvalidRenderDefaults { .. })
    ));

    let err = EaselConfig::from_yaml_str("analysis: [1, 2]").unwrap_err();
    assert_eq!(err.category(), "Serialisation");

    let err = EaselConfig::from_yaml_file("/definitely/not/here/easel.yaml").unwrap_err();
    assert!(matches!(
        err,
        ChartAssistantError::Config(ConfigError::ConfigFileError { .. })
    ));
}

#[test]
fn test_csv_input() {
    let csv = "Region,Sales,Note\nNorth,120,\nSouth,80.5,late\nEast,,n/a\n";
    let data = TabularResult::from_csv_reader(csv.as_bytes()).unwrap();
    assert_eq!(data.total_rows, 3);
    assert_eq!(data.columns[0].declared_type, "string");
    assert_eq!(data.columns[1].declared_type, "number");
    assert_eq!(data.columns[2].declared_type, "string");
    assert_eq!(data.rows[0][1].value, json!(120));
    assert_eq!(data.rows[1][1].value, json!(80.5));
    assert!(data.rows[2][1].value.is_null());

    let err = TabularResult::from_csv_reader("a,b\n1,2,3\n".as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        DataError::RowTooWide {
            row: 1,
            expected: 2,
            found: 3
        }
    ));

    let err = TabularResult::from_csv_reader("".as_bytes()).unwrap_err();
    assert!(matches!(err, DataError::MissingHeader));
    let wrapped = ChartAssistantError::from(err);
    assert!(wrapped.user_message().contains("header row"));
}

#[test]
fn test_export_request_wire_format() {
    let data = monthly_revenue();
    let config = ChartAssistant::new().fallback(&data).unwrap();
    let request = ExportRequest::new("revenue_dashboard-2024", &config).unwrap();
    let encoded = serde_json::to_value(&request).unwrap();

    assert_eq!(encoded["projectName"], json!("revenue_dashboard-2024"));
    assert_eq!(encoded["chartConfig"]["type"], json!("line"));
    assert_eq!(encoded["chartConfig"]["title"], json!("Revenue by Month"));
    assert_eq!(
        encoded["chartConfig"]["highchartsConfig"],
        config.render_options
    );

    for bad in ["", "-rf", "my project", "../etc", "naïve"] {
        let err = ExportRequest::new(bad, &config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProjectName { .. }), "{bad:?}");
    }
    let wrapped = ChartAssistantError::from(ExportRequest::new("a b", &config).unwrap_err());
    assert!(wrapped.user_message().contains("'a b'"));
}

#[test]
fn test_export_response_outcomes() {
    let ok: ExportResponse =
        serde_json::from_str(r#"{"success": true, "downloadUrl": "/downloads/app.zip"}"#).unwrap();
    assert_eq!(ok.into_result(), Ok("/downloads/app.zip".to_string()));

    let failed: ExportResponse =
        serde_json::from_str(r#"{"success": false, "error": "build failed"}"#).unwrap();
    assert_eq!(failed.into_result(), Err("build failed".to_string()));

    let bare: ExportResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
    assert!(bare.into_result().is_err());
}

#[test]
fn test_model_errors_are_recoverable() {
    let err = ChartAssistantError::from(ModelError::EmptyResponse);
    assert!(err.is_recoverable());
    assert_eq!(err.category(), "Model");
    assert!(err.user_message().contains("suggested chart"));
    assert!(err.to_string().contains("empty response"));
}
