//! Telemetry Reshaping
//!
//! Turns the flat append-only record buffer into the derived structures the
//! charts and insights consume:
//!
//! - **Wide table**: one sparse row per distinct receipt time, one column
//!   per parameter seen so far
//! - **Parameter list**: distinct parameters in display order (voltage
//!   first, then current, then the rest alphabetically)
//! - **Categorical map**: per-parameter value→rank assignments for
//!   non-numeric values, stable once assigned
//! - **Classification**: numeric vs. categorical, decided by the first
//!   observed value and never revisited
//!
//! Reshaping is a full recompute over the raw buffer on every change. At
//! the target scale (a few thousand records per viewing session) that is
//! simpler than maintaining incremental derived state; see DESIGN.md for
//! the extension point if volumes ever grow.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::telemetry::RawRecord;

/// A materialized cell of the wide table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Numeric interpretation of the cell, if it has one.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Raw display form, as it keys the categorical map.
    pub fn display(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// One row of the wide table: every parameter observed at one receipt time.
///
/// Columns are sparse; a parameter with no observation at this time is
/// simply absent. `tm_id` and `local_date_time` come from the first record
/// seen at this timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideRow {
    pub tm_received_time: f64,
    pub tm_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_date_time: Option<String>,
    #[serde(flatten)]
    pub columns: HashMap<String, CellValue>,
}

impl WideRow {
    fn from_record(record: &RawRecord) -> Self {
        Self {
            tm_received_time: record.tm_received_time,
            tm_id: record.tm_id,
            local_date_time: record.local_date_time.clone(),
            columns: HashMap::new(),
        }
    }
}

/// Whether a parameter plots as a continuous line or a stepped trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Numeric,
    Categorical,
}

/// Per-parameter value→rank assignments, 1-based, in first-seen order.
pub type CategoricalMap = HashMap<String, HashMap<String, u32>>;

/// Everything derived from one pass over the raw buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reshaped {
    pub wide_rows: Vec<WideRow>,
    pub parameters: Vec<String>,
    pub categorical_map: CategoricalMap,
    pub classification: HashMap<String, ParamKind>,
}

impl Default for Reshaped {
    fn default() -> Self {
        Self::empty()
    }
}

impl Reshaped {
    /// An empty result, what a session holds before any data arrives.
    pub fn empty() -> Self {
        Self {
            wide_rows: Vec::new(),
            parameters: Vec::new(),
            categorical_map: HashMap::new(),
            classification: HashMap::new(),
        }
    }

    /// Whether the parameter is known and classified categorical.
    pub fn is_categorical(&self, parameter: &str) -> bool {
        self.classification.get(parameter) == Some(&ParamKind::Categorical)
    }
}

/// Reshape the raw buffer into the wide table and its companions.
///
/// Pure: records are folded in input order (receipt order, which is not
/// necessarily increasing `tm_received_time` once streamed updates arrive),
/// and calling this again with the same buffer yields a structurally
/// identical result.
pub fn reshape(records: &[RawRecord]) -> Reshaped {
    let mut first_seen: Vec<String> = Vec::new();
    let mut classification: HashMap<String, ParamKind> = HashMap::new();
    let mut categorical_map: CategoricalMap = HashMap::new();
    let mut wide_rows: Vec<WideRow> = Vec::new();
    let mut row_by_time: HashMap<u64, usize> = HashMap::new();

    for record in records {
        if !first_seen.contains(&record.parameter) {
            first_seen.push(record.parameter.clone());
        }

        // Records without a value still announce the parameter, but carry
        // no cell and do not classify it.
        let value = match &record.value {
            Some(v) => v,
            None => continue,
        };

        let numeric = value.as_numeric();

        classification
            .entry(record.parameter.clone())
            .or_insert(match numeric {
                Some(_) => ParamKind::Numeric,
                None => ParamKind::Categorical,
            });

        if numeric.is_none() {
            let ranks = categorical_map.entry(record.parameter.clone()).or_default();
            let raw = value.display();
            if !ranks.contains_key(&raw) {
                let next = ranks.len() as u32 + 1;
                ranks.insert(raw, next);
            }
        }

        let row_idx = *row_by_time
            .entry(record.tm_received_time.to_bits())
            .or_insert_with(|| {
                wide_rows.push(WideRow::from_record(record));
                wide_rows.len() - 1
            });

        let cell = match numeric {
            Some(n) => CellValue::Number(n),
            None => CellValue::Text(value.display()),
        };
        wide_rows[row_idx].columns.insert(record.parameter.clone(), cell);
    }

    Reshaped {
        wide_rows,
        parameters: sort_parameters(first_seen),
        categorical_map,
        classification,
    }
}

/// Display order: voltage parameters first, then current, then the rest in
/// case-sensitive lexical order. A grouping convention from the EPS
/// operators, not a numeric priority.
fn sort_parameters(params: Vec<String>) -> Vec<String> {
    let mut voltage = Vec::new();
    let mut current = Vec::new();
    let mut rest = Vec::new();

    for param in params {
        if param.contains("voltage") {
            voltage.push(param);
        } else if param.contains("current") {
            current.push(param);
        } else {
            rest.push(param);
        }
    }
    rest.sort();

    voltage.into_iter().chain(current).chain(rest).collect()
}

fn family_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(_voltage|_current|_\d+)$").expect("valid family pattern")
    })
}

/// The display family of a parameter: its name with one trailing
/// `_voltage`, `_current`, or `_<digits>` suffix stripped.
pub fn parameter_family(parameter: &str) -> String {
    family_pattern().replace(parameter, "").into_owned()
}

/// Group parameters into display families, preserving input order both for
/// the families and for the members within each.
pub fn group_families(parameters: &[String]) -> Vec<(String, Vec<String>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();

    for param in parameters {
        let family = parameter_family(param);
        if !groups.contains_key(&family) {
            order.push(family.clone());
        }
        groups.entry(family).or_default().push(param.clone());
    }

    order
        .into_iter()
        .map(|family| {
            let members = groups.remove(&family).unwrap_or_default();
            (family, members)
        })
        .collect()
}
