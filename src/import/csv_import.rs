//! CSV Import
//!
//! Parses telemetry CSV exports. Columns are located by header name, so
//! column order does not matter; `tm_received_time` and `parameter` are
//! required, everything else is optional.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Map;

use super::{FileImporter, ImportError, ImportOutcome};
use crate::telemetry::{ParamValue, RawRecord};

/// Header-mapped CSV importer.
pub struct CsvImporter {
    time_column: String,
    id_column: String,
    parameter_column: String,
    value_column: String,
    local_time_column: String,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImporter {
    /// Importer with the store's canonical column names.
    pub fn new() -> Self {
        Self {
            time_column: "tm_received_time".to_string(),
            id_column: "tm_id".to_string(),
            parameter_column: "parameter".to_string(),
            value_column: "value".to_string(),
            local_time_column: "local_date_time".to_string(),
        }
    }

    fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }
}

impl FileImporter for CsvImporter {
    fn import(&self, content: &str) -> Result<ImportOutcome, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ImportError::Parse(e.to_string()))?
            .clone();

        let time_idx = Self::column_index(&headers, &self.time_column)
            .ok_or_else(|| ImportError::Parse(format!("missing column {}", self.time_column)))?;
        let parameter_idx = Self::column_index(&headers, &self.parameter_column).ok_or_else(
            || ImportError::Parse(format!("missing column {}", self.parameter_column)),
        )?;
        let id_idx = Self::column_index(&headers, &self.id_column);
        let value_idx = Self::column_index(&headers, &self.value_column);
        let local_idx = Self::column_index(&headers, &self.local_time_column);

        let mut outcome = ImportOutcome::default();

        for (line_num, result) in reader.records().enumerate() {
            // Header occupies line 1.
            let line = line_num + 2;

            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    outcome.push_warning(format!("line {}: {}", line, e));
                    continue;
                }
            };

            let time_str = row.get(time_idx).map(str::trim).unwrap_or_default();
            let tm_received_time = match parse_receipt_time(time_str) {
                Some(t) => t,
                None => {
                    outcome.push_warning(format!("line {}: bad receipt time '{}'", line, time_str));
                    continue;
                }
            };

            let parameter = row.get(parameter_idx).map(str::trim).unwrap_or_default();
            if parameter.is_empty() {
                outcome.push_warning(format!("line {}: empty parameter", line));
                continue;
            }

            let tm_id = id_idx
                .and_then(|idx| row.get(idx))
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(0);

            let value = value_idx
                .and_then(|idx| row.get(idx))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| match s.parse::<f64>() {
                    Ok(n) if n.is_finite() => ParamValue::Number(n),
                    _ => ParamValue::Text(s.to_string()),
                });

            let local_date_time = local_idx
                .and_then(|idx| row.get(idx))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            outcome.records.push(RawRecord {
                tm_received_time,
                tm_id,
                parameter: parameter.to_string(),
                value,
                local_date_time,
                extra: Map::new(),
            });
        }

        Ok(outcome)
    }
}

/// Receipt times are usually numeric epochs; date strings from hand-edited
/// exports are accepted too and converted to epoch milliseconds.
fn parse_receipt_time(text: &str) -> Option<f64> {
    if let Ok(n) = text.parse::<f64>() {
        return n.is_finite().then_some(n);
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y/%m/%d %H:%M:%S",
    ];
    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc().timestamp_millis() as f64);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis() as f64);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc).timestamp_millis() as f64);
    }

    None
}
