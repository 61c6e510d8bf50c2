//! Chart Preparation
//!
//! Groups selected parameters into display families and materializes their
//! windowed series. Numeric families plot as continuous lines; a family
//! with any categorical member plots as a stepped trace with values mapped
//! through the categorical ranks. Mixed families degrade to categorical
//! treatment for the whole family: the numeric members are left out rather
//! than plotted on a rank axis. A documented limitation, not a bug.

use crate::reshape::{group_families, Reshaped};
use crate::telemetry::TimeWindow;

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub time: f64,
    pub value: f64,
}

/// One parameter's series within a group.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub parameter: String,
    pub points: Vec<ChartPoint>,
}

/// How a group's series are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    /// Continuous numeric series.
    Line,
    /// Rank-valued categorical series.
    Step,
}

/// One chart: a display family with its prepared series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGroup {
    pub family: String,
    pub style: ChartStyle,
    pub series: Vec<ChartSeries>,
    /// For step groups, the `(raw value, rank)` pairs backing the y axis,
    /// rank-ascending. Empty for line groups.
    pub value_labels: Vec<(String, u32)>,
}

/// Consumes prepared chart groups. Implemented by the rendering layer;
/// this crate only prepares.
pub trait ChartRenderer {
    fn render(&mut self, groups: &[ChartGroup]);
}

/// Prepare chart groups for `selected` parameters over `window`.
pub fn prepare_chart_groups(
    reshaped: &Reshaped,
    selected: &[String],
    window: TimeWindow,
) -> Vec<ChartGroup> {
    group_families(selected)
        .into_iter()
        .filter_map(|(family, members)| {
            let categorical = members.iter().any(|p| reshaped.is_categorical(p));
            if categorical {
                step_group(reshaped, family, &members, window)
            } else {
                line_group(reshaped, family, &members, window)
            }
        })
        .collect()
}

fn line_group(
    reshaped: &Reshaped,
    family: String,
    members: &[String],
    window: TimeWindow,
) -> Option<ChartGroup> {
    let series: Vec<ChartSeries> = members
        .iter()
        .map(|parameter| ChartSeries {
            parameter: parameter.clone(),
            points: numeric_points(reshaped, parameter, window),
        })
        .collect();

    Some(ChartGroup {
        family,
        style: ChartStyle::Line,
        series,
        value_labels: Vec::new(),
    })
}

fn step_group(
    reshaped: &Reshaped,
    family: String,
    members: &[String],
    window: TimeWindow,
) -> Option<ChartGroup> {
    let categorical_members: Vec<&String> = members
        .iter()
        .filter(|p| reshaped.is_categorical(p))
        .collect();

    let series: Vec<ChartSeries> = categorical_members
        .iter()
        .map(|parameter| ChartSeries {
            parameter: (*parameter).clone(),
            points: rank_points(reshaped, parameter, window),
        })
        .collect();

    let mut value_labels: Vec<(String, u32)> = categorical_members
        .iter()
        .filter_map(|p| reshaped.categorical_map.get(*p))
        .flat_map(|ranks| ranks.iter().map(|(value, rank)| (value.clone(), *rank)))
        .collect();
    value_labels.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    value_labels.dedup();

    Some(ChartGroup {
        family,
        style: ChartStyle::Step,
        series,
        value_labels,
    })
}

fn numeric_points(reshaped: &Reshaped, parameter: &str, window: TimeWindow) -> Vec<ChartPoint> {
    reshaped
        .wide_rows
        .iter()
        .filter(|row| window.contains(row.tm_received_time))
        .filter_map(|row| {
            let value = row.columns.get(parameter)?.as_numeric()?;
            Some(ChartPoint {
                time: row.tm_received_time,
                value,
            })
        })
        .collect()
}

fn rank_points(reshaped: &Reshaped, parameter: &str, window: TimeWindow) -> Vec<ChartPoint> {
    let Some(ranks) = reshaped.categorical_map.get(parameter) else {
        return Vec::new();
    };

    reshaped
        .wide_rows
        .iter()
        .filter(|row| window.contains(row.tm_received_time))
        .filter_map(|row| {
            let cell = row.columns.get(parameter)?;
            let rank = ranks.get(&cell.display())?;
            Some(ChartPoint {
                time: row.tm_received_time,
                value: *rank as f64,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::reshape;
    use crate::telemetry::{ParamValue, RawRecord};

    fn numeric(time: f64, parameter: &str, value: f64) -> RawRecord {
        RawRecord::new(time, 1, parameter, ParamValue::Number(value))
    }

    fn text(time: f64, parameter: &str, value: &str) -> RawRecord {
        RawRecord::new(time, 1, parameter, ParamValue::Text(value.to_string()))
    }

    #[test]
    fn test_numeric_family_is_a_line_group() {
        let reshaped = reshape(&[
            numeric(100.0, "bus_voltage", 3.3),
            numeric(200.0, "bus_voltage", 3.4),
            numeric(100.0, "bus_current", 0.2),
        ]);

        let groups = prepare_chart_groups(
            &reshaped,
            &["bus_voltage".to_string(), "bus_current".to_string()],
            TimeWindow::unbounded(),
        );

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].family, "bus");
        assert_eq!(groups[0].style, ChartStyle::Line);
        assert_eq!(groups[0].series.len(), 2);
        assert_eq!(groups[0].series[0].points.len(), 2);
    }

    #[test]
    fn test_categorical_series_plot_by_rank() {
        let reshaped = reshape(&[
            text(1.0, "heater_state", "OFF"),
            text(2.0, "heater_state", "ON"),
            text(3.0, "heater_state", "OFF"),
        ]);

        let groups = prepare_chart_groups(
            &reshaped,
            &["heater_state".to_string()],
            TimeWindow::unbounded(),
        );

        assert_eq!(groups[0].style, ChartStyle::Step);
        let values: Vec<f64> = groups[0].series[0].points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 1.0]);
        assert_eq!(
            groups[0].value_labels,
            vec![("OFF".to_string(), 1), ("ON".to_string(), 2)]
        );
    }

    #[test]
    fn test_mixed_family_degrades_to_step_without_numeric_members() {
        let reshaped = reshape(&[
            numeric(1.0, "conv_voltage", 4.1),
            text(1.0, "conv_current", "TRIP"),
        ]);
        let groups = prepare_chart_groups(
            &reshaped,
            &["conv_voltage".to_string(), "conv_current".to_string()],
            TimeWindow::unbounded(),
        );

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].family, "conv");
        assert_eq!(groups[0].style, ChartStyle::Step);
        assert_eq!(groups[0].series.len(), 1);
        assert_eq!(groups[0].series[0].parameter, "conv_current");
    }

    #[test]
    fn test_window_filters_points() {
        let reshaped = reshape(&[
            numeric(100.0, "bus_voltage", 1.0),
            numeric(200.0, "bus_voltage", 2.0),
            numeric(300.0, "bus_voltage", 3.0),
        ]);

        let groups = prepare_chart_groups(
            &reshaped,
            &["bus_voltage".to_string()],
            TimeWindow::between(150.0, 250.0),
        );

        assert_eq!(groups[0].series[0].points.len(), 1);
        assert_eq!(groups[0].series[0].points[0].value, 2.0);
    }
}
