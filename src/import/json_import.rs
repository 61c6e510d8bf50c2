//! JSON Import
//!
//! Parses a JSON array of store-shaped documents. Elements that do not
//! deserialize into a record are skipped with a warning.

use serde_json::Value;

use super::{FileImporter, ImportError, ImportOutcome};
use crate::telemetry::RawRecord;

pub struct JsonImporter;

impl FileImporter for JsonImporter {
    fn import(&self, content: &str) -> Result<ImportOutcome, ImportError> {
        let parsed: Value =
            serde_json::from_str(content).map_err(|e| ImportError::Parse(e.to_string()))?;

        let Value::Array(elements) = parsed else {
            return Err(ImportError::Parse(
                "expected a JSON array of telemetry documents".to_string(),
            ));
        };

        let mut outcome = ImportOutcome::default();
        for (index, element) in elements.into_iter().enumerate() {
            match serde_json::from_value::<RawRecord>(element) {
                Ok(record) => outcome.records.push(record),
                Err(e) => outcome.push_warning(format!("element {}: {}", index, e)),
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::ParamValue;

    #[test]
    fn test_import_document_array() {
        let json = r#"[
            {"tm_received_time": 100, "tm_id": 1, "parameter": "bus_voltage", "value": 3.3},
            {"tm_received_time": 100, "tm_id": 1, "parameter": "obc_mode", "value": "SAFE"}
        ]"#;

        let outcome = JsonImporter.import(json).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].value, Some(ParamValue::Number(3.3)));
        assert_eq!(
            outcome.records[1].value,
            Some(ParamValue::Text("SAFE".to_string()))
        );
    }

    #[test]
    fn test_bad_elements_become_warnings() {
        let json = r#"[
            {"tm_received_time": 100, "tm_id": 1, "parameter": "bus_voltage", "value": 3.3},
            {"value": "orphaned"},
            42
        ]"#;

        let outcome = JsonImporter.import(json).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.rows_failed, 2);
    }

    #[test]
    fn test_non_array_is_an_error() {
        let result = JsonImporter.import(r#"{"not": "an array"}"#);
        assert!(matches!(result, Err(ImportError::Parse(_))));
    }
}
