//! View Session
//!
//! One operator's viewing state: the append-only raw buffer fed by the
//! initial fetch and the live channel, the reshaped table derived from it,
//! the selected parameters, and the time window. Reshaping runs
//! synchronously on buffer-change boundaries; a duplicate streamed record
//! changes nothing and triggers no recompute, so the frontend never
//! re-renders for nothing.

use crate::insights;
use crate::merge;
use crate::reshape::{reshape, Reshaped};
use crate::telemetry::{RawRecord, TimeWindow};
use crate::view::chart::{prepare_chart_groups, ChartGroup};

/// Client-side session state for one collection view.
#[derive(Default)]
pub struct ViewSession {
    raw: Vec<RawRecord>,
    reshaped: Reshaped,
    selected: Vec<String>,
    window: TimeWindow,
    live: bool,
    reshape_count: u64,
}

impl ViewSession {
    pub fn new() -> Self {
        Self {
            live: true,
            ..Self::default()
        }
    }

    /// Load the initial fetch, replacing any prior buffer. The fetch runs
    /// through the merger so a store that hands back duplicates cannot
    /// seed a corrupt buffer.
    pub fn load(&mut self, records: Vec<RawRecord>) {
        self.raw.clear();
        merge::merge_all(&mut self.raw, records);
        self.rebuild();
    }

    /// Merge one streamed record. Returns `true` when the buffer changed
    /// (and the derived state was rebuilt), `false` for a duplicate.
    pub fn apply_update(&mut self, record: RawRecord) -> bool {
        if !merge::merge(&mut self.raw, record) {
            return false;
        }
        self.rebuild();
        true
    }

    fn rebuild(&mut self) {
        self.reshaped = reshape(&self.raw);
        self.reshape_count += 1;

        // The window grows to cover new data, never shrinks; an operator
        // range stays valid as live records extend the span.
        for row in &self.reshaped.wide_rows {
            self.window.extend_to(row.tm_received_time);
        }
    }

    /// Mark the live channel as lost. The session keeps serving parameter
    /// and window controls on the data it already holds; reconnection is
    /// left to the operator (see DESIGN.md).
    pub fn channel_lost(&mut self, reason: &str) {
        if self.live {
            tracing::error!(reason = %reason, "live update channel lost");
            self.live = false;
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Select a parameter for plotting; unknown names are accepted and
    /// simply plot empty until data for them arrives.
    pub fn select(&mut self, parameter: &str) {
        if !self.selected.iter().any(|p| p == parameter) {
            self.selected.push(parameter.to_string());
        }
    }

    pub fn deselect(&mut self, parameter: &str) {
        self.selected.retain(|p| p != parameter);
    }

    /// Select every parameter currently known, in display order.
    pub fn select_all(&mut self) {
        self.selected = self.reshaped.parameters.clone();
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Set an explicit window. Later data still widens it.
    pub fn set_window(&mut self, window: TimeWindow) {
        self.window = window;
    }

    /// Reset to the full observed span.
    pub fn reset_window(&mut self) {
        self.window = TimeWindow::unbounded();
        for row in &self.reshaped.wide_rows {
            self.window.extend_to(row.tm_received_time);
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn record_count(&self) -> usize {
        self.raw.len()
    }

    pub fn parameters(&self) -> &[String] {
        &self.reshaped.parameters
    }

    pub fn reshaped(&self) -> &Reshaped {
        &self.reshaped
    }

    /// How many times the derived state has been rebuilt.
    pub fn reshape_count(&self) -> u64 {
        self.reshape_count
    }

    /// Insight lines over the current window.
    pub fn insights(&self) -> Vec<String> {
        insights::summarize(&self.reshaped, self.window)
    }

    /// Chart groups for the current selection and window.
    pub fn chart_groups(&self) -> Vec<ChartGroup> {
        prepare_chart_groups(&self.reshaped, &self.selected, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::ParamValue;

    fn record(time: f64, parameter: &str, value: f64) -> RawRecord {
        RawRecord::new(time, 1, parameter, ParamValue::Number(value))
    }

    #[test]
    fn test_streamed_duplicate_of_fetched_record_is_dropped() {
        let fetched = record(1.0, "bus_voltage", 3.3);

        let mut session = ViewSession::new();
        session.load(vec![fetched.clone()]);
        assert_eq!(session.record_count(), 1);

        let changed = session.apply_update(fetched);
        assert!(!changed);
        assert_eq!(session.record_count(), 1);
    }

    #[test]
    fn test_duplicate_update_skips_rebuild() {
        let mut session = ViewSession::new();
        session.load(vec![record(1.0, "bus_voltage", 3.3)]);
        let rebuilds = session.reshape_count();

        session.apply_update(record(1.0, "bus_voltage", 3.3));
        assert_eq!(session.reshape_count(), rebuilds);

        session.apply_update(record(2.0, "bus_voltage", 3.4));
        assert_eq!(session.reshape_count(), rebuilds + 1);
    }

    #[test]
    fn test_window_widens_with_live_data() {
        let mut session = ViewSession::new();
        session.load(vec![record(100.0, "bus_voltage", 3.3)]);
        session.set_window(TimeWindow::between(100.0, 100.0));

        session.apply_update(record(300.0, "bus_voltage", 3.4));
        assert_eq!(session.window(), TimeWindow::between(100.0, 300.0));
    }

    #[test]
    fn test_controls_survive_channel_loss() {
        let mut session = ViewSession::new();
        session.load(vec![
            record(100.0, "bus_voltage", 1.0),
            record(200.0, "bus_voltage", 5.0),
        ]);

        session.channel_lost("transport reset");
        assert!(!session.is_live());

        session.select("bus_voltage");
        session.set_window(TimeWindow::between(100.0, 200.0));
        assert_eq!(
            session.insights(),
            vec!["bus_voltage: Min 1.00, Max 5.00, Avg 3.00"]
        );
        assert_eq!(session.chart_groups().len(), 1);
    }

    #[test]
    fn test_select_all_uses_display_order() {
        let mut session = ViewSession::new();
        session.load(vec![
            record(1.0, "bus_current", 0.2),
            record(2.0, "cell_voltage", 3.3),
            record(3.0, "alpha", 1.0),
            record(4.0, "bus_voltage", 12.0),
        ]);

        session.select_all();
        assert_eq!(
            session.selected(),
            vec!["cell_voltage", "bus_voltage", "bus_current", "alpha"]
        );
    }

    #[test]
    fn test_load_dedupes_fetched_records() {
        let mut session = ViewSession::new();
        session.load(vec![
            record(1.0, "bus_voltage", 3.3),
            record(1.0, "bus_voltage", 3.3),
        ]);
        assert_eq!(session.record_count(), 1);
    }
}
