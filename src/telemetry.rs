//! Telemetry Data Model
//!
//! Core wire types shared by the server and the viewing pipeline.
//! Documents travel "exactly as stored": known fields are typed, anything
//! else rides along in a flattened passthrough map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single telemetry observation value.
///
/// Stores keep values as either JSON numbers or strings; an untagged enum
/// round-trips both without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Numeric reading (voltages, currents, counters).
    Number(f64),
    /// Textual reading (mode flags like "ON"/"OFF", status strings).
    Text(String),
}

impl ParamValue {
    /// Numeric interpretation of the value, if it has one.
    ///
    /// Text values that parse as finite numbers count as numeric, matching
    /// how stores deliver numbers that were logged as strings.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) if n.is_finite() => Some(*n),
            ParamValue::Number(_) => None,
            ParamValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// The raw display form of the value.
    pub fn display(&self) -> String {
        match self {
            ParamValue::Number(n) => n.to_string(),
            ParamValue::Text(s) => s.clone(),
        }
    }
}

/// One telemetry observation as stored in a collection.
///
/// Identity is `(tm_received_time, tm_id, parameter)`; two records with the
/// same identity are duplicates and the later one is discarded on merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Receipt time at the ground station (epoch-based, store-defined unit).
    pub tm_received_time: f64,
    /// Telemetry frame identifier.
    pub tm_id: i64,
    /// Parameter name (e.g. `bus_voltage`, `obc_mode`).
    pub parameter: String,
    /// Observed value; absent for frames that only mark an event.
    #[serde(default)]
    pub value: Option<ParamValue>,
    /// Human-readable local timestamp, when the store recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_date_time: Option<String>,
    /// Store fields we do not interpret, passed through untouched. An
    /// empty map flattens to nothing on the wire.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawRecord {
    /// Build a record with just the identity fields and a value.
    pub fn new(
        tm_received_time: f64,
        tm_id: i64,
        parameter: impl Into<String>,
        value: ParamValue,
    ) -> Self {
        Self {
            tm_received_time,
            tm_id,
            parameter: parameter.into(),
            value: Some(value),
            local_date_time: None,
            extra: Map::new(),
        }
    }

    /// The record's identity key.
    pub fn key(&self) -> RecordKey<'_> {
        RecordKey {
            time_bits: self.tm_received_time.to_bits(),
            tm_id: self.tm_id,
            parameter: &self.parameter,
        }
    }

    /// Whether two records share the same identity key.
    pub fn same_identity(&self, other: &RawRecord) -> bool {
        self.key() == other.key()
    }
}

/// Identity key of a [`RawRecord`].
///
/// Receipt times compare bitwise so the key stays `Eq` (the buffer holds
/// whatever the store sent, including repeated exact floats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey<'a> {
    time_bits: u64,
    tm_id: i64,
    parameter: &'a str,
}

/// An inclusive time window over receipt times.
///
/// Unset bounds are unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeWindow {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl TimeWindow {
    /// A window with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A window spanning `[start, end]`, inclusive on both ends.
    pub fn between(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Whether `time` falls inside the window.
    pub fn contains(&self, time: f64) -> bool {
        if let Some(start) = self.start {
            if time < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if time > end {
                return false;
            }
        }
        true
    }

    /// Widen the window so it covers `time`, never shrinking it.
    pub fn extend_to(&mut self, time: f64) {
        self.start = Some(match self.start {
            Some(s) => s.min(time),
            None => time,
        });
        self.end = Some(match self.end {
            Some(e) => e.max(time),
            None => time,
        });
    }
}
