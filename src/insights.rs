//! Insights
//!
//! Summary statistics over a time-windowed view of the reshaped table:
//! min/max/mean for numeric parameters, frequency counts for categorical
//! ones. Output lines feed the operator's insights panel verbatim.

use crate::reshape::{ParamKind, Reshaped, WideRow};
use crate::telemetry::TimeWindow;

/// Summarize every parameter over the rows inside `window`.
///
/// Numeric parameters with at least one defined, parseable value emit
/// `"<param>: Min <min>, Max <max>, Avg <avg>"` (two decimals each).
/// Categorical parameters emit `"<param>: <value> (<count>), ..."` with
/// values listed in first-seen order within the window. Parameters with no
/// observations in the window emit nothing.
pub fn summarize(reshaped: &Reshaped, window: TimeWindow) -> Vec<String> {
    let rows: Vec<&WideRow> = reshaped
        .wide_rows
        .iter()
        .filter(|row| window.contains(row.tm_received_time))
        .collect();

    let mut lines = Vec::new();

    for parameter in &reshaped.parameters {
        match reshaped.classification.get(parameter) {
            Some(ParamKind::Numeric) => {
                if let Some(line) = numeric_summary(parameter, &rows) {
                    lines.push(line);
                }
            }
            Some(ParamKind::Categorical) => {
                if let Some(line) = categorical_summary(parameter, &rows) {
                    lines.push(line);
                }
            }
            // Never classified: the parameter carried no values at all.
            None => {}
        }
    }

    lines
}

fn numeric_summary(parameter: &str, rows: &[&WideRow]) -> Option<String> {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.columns.get(parameter))
        .filter_map(|cell| cell.as_numeric())
        .collect();

    if values.is_empty() {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.iter().sum::<f64>() / values.len() as f64;

    Some(format!(
        "{}: Min {:.2}, Max {:.2}, Avg {:.2}",
        parameter, min, max, avg
    ))
}

fn categorical_summary(parameter: &str, rows: &[&WideRow]) -> Option<String> {
    // First-seen order within the window, so counts read in the order the
    // operator watched the values arrive.
    let mut counts: Vec<(String, usize)> = Vec::new();

    for row in rows {
        if let Some(cell) = row.columns.get(parameter) {
            let value = cell.display();
            match counts.iter_mut().find(|(seen, _)| *seen == value) {
                Some((_, count)) => *count += 1,
                None => counts.push((value, 1)),
            }
        }
    }

    if counts.is_empty() {
        return None;
    }

    let stats = counts
        .iter()
        .map(|(value, count)| format!("{} ({})", value, count))
        .collect::<Vec<_>>()
        .join(", ");

    Some(format!("{}: {}", parameter, stats))
}
