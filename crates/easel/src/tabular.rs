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

//! Query results as delivered by the data source.
//!
//! Rows are positional: cell `i` of a row belongs to `columns[i]`. Rows may be
//! shorter than the column list, in which case the missing cells are simply
//! absent.

use crate::error::{DataError, DataResult};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::io::Read;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TabularResultWire")]
pub struct TabularResult {
    /// Row count at the source, which exceeds `rows.len()` for sampled
    /// results. Taken from `rows.len()` when the input omits it.
    pub total_rows: usize,
    #[serde(default)]
    pub is_aggregated: bool,
    #[serde(default)]
    pub is_sampled: bool,
    #[serde(default)]
    pub columns: Vec<ColumnHeader>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnHeader {
    pub label: String,
    /// Free text from the source system, e.g. `"VARCHAR(255)"` or `"double"`.
    #[serde(rename = "dataType", alias = "declaredType", default)]
    pub declared_type: String,
    #[serde(default)]
    pub id: String,
}

/// Incoming shape of [`TabularResult`]; only `totalRows` may be absent.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TabularResultWire {
    #[serde(default)]
    total_rows: Option<usize>,
    #[serde(default)]
    is_aggregated: bool,
    #[serde(default)]
    is_sampled: bool,
    #[serde(default)]
    columns: Vec<ColumnHeader>,
    #[serde(default)]
    rows: Vec<Row>,
}

impl From<TabularResultWire> for TabularResult {
    fn from(wire: TabularResultWire) -> Self {
        Self {
            total_rows: wire.total_rows.unwrap_or(wire.rows.len()),
            is_aggregated: wire.is_aggregated,
            is_sampled: wire.is_sampled,
            columns: wire.columns,
            rows: wire.rows,
        }
    }
}

pub type Row = Vec<Cell>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub formatted: Option<String>,
}

impl ColumnHeader {
    pub fn new(label: &str, declared_type: &str) -> Self {
        Self {
            label: label.to_string(),
            declared_type: declared_type.to_string(),
            id: label.to_lowercase().replace(' ', "_"),
        }
    }
}

impl Cell {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            formatted: None,
        }
    }

    pub fn with_formatted(mut self, formatted: &str) -> Self {
        self.formatted = Some(formatted.to_string());
        self
    }

    /// Display label for categories: the formatted text when present and
    /// non-empty, otherwise the raw value rendered as text.
    pub fn label(&self) -> String {
        match self.formatted.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => value_text(&self.value),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        coerce_number(&self.value)
    }
}

/// Coerces a raw cell value to a finite number. Numeric strings count;
/// null, booleans, and composite values do not.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TabularResult {
    pub fn new(columns: Vec<ColumnHeader>, rows: Vec<Row>) -> Self {
        Self {
            total_rows: rows.len(),
            is_aggregated: false,
            is_sampled: false,
            columns,
            rows,
        }
    }

    pub fn from_json_str(input: &str) -> DataResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> DataResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Reads a CSV file with a header row. Cells that parse as finite numbers
    /// become numbers, empty cells become null, everything else stays text.
    /// A column is declared `number` when every non-empty cell is numeric.
    pub fn from_csv_reader<R: Read>(reader: R) -> DataResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        if headers.is_empty() {
            return Err(DataError::MissingHeader);
        }

        let width = headers.len();
        let mut numeric_cells = vec![0usize; width];
        let mut filled_cells = vec![0usize; width];
        let mut rows = Vec::new();

        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() > width {
                return Err(DataError::RowTooWide {
                    row: index + 1,
                    expected: width,
                    found: record.len(),
                });
            }
            let row: Row = record
                .iter()
                .enumerate()
                .map(|(col, raw)| {
                    let value = parse_csv_value(raw);
                    if !value.is_null() {
                        filled_cells[col] += 1;
                        if value.is_number() {
                            numeric_cells[col] += 1;
                        }
                    }
                    Cell::new(value)
                })
                .collect();
            rows.push(row);
        }

        let columns = headers
            .iter()
            .enumerate()
            .map(|(col, label)| {
                let declared = if filled_cells[col] > 0 && numeric_cells[col] == filled_cells[col] {
                    "number"
                } else {
                    "string"
                };
                ColumnHeader::new(label.trim(), declared)
            })
            .collect();

        debug!(columns = width, rows = rows.len(), "Loaded CSV tabular result");
        Ok(Self::new(columns, rows))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Values of one column in row order. Rows too short to hold the column
    /// are skipped rather than read as null.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(column).map(|cell| &cell.value))
    }

    pub fn sample(&self, n: usize) -> &[Row] {
        &self.rows[..self.rows.len().min(n)]
    }
}

fn parse_csv_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .and_then(Number::from_f64)
    {
        return Value::Number(number);
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_number_accepts_numeric_strings_only() {
        assert_eq!(coerce_number(&json!(4.5)), Some(4.5));
        assert_eq!(coerce_number(&json!(" 12 ")), Some(12.0));
        assert_eq!(coerce_number(&json!("12abc")), None);
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn label_prefers_non_empty_formatted_text() {
        let cell = Cell::new(json!(1_700_000_000)).with_formatted("Nov 2023");
        assert_eq!(cell.label(), "Nov 2023");
        let cell = Cell::new(json!("East")).with_formatted("");
        assert_eq!(cell.label(), "East");
        assert_eq!(Cell::new(json!(null)).label(), "");
        assert_eq!(Cell::new(json!(3)).label(), "3");
    }

    #[test]
    fn csv_value_parsing_keeps_integers_integral() {
        assert_eq!(parse_csv_value("42"), json!(42));
        assert_eq!(parse_csv_value("4.25"), json!(4.25));
        assert_eq!(parse_csv_value("  "), Value::Null);
        assert_eq!(parse_csv_value("West"), json!("West"));
    }
}
