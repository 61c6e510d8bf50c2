//! Viewing Pipeline
//!
//! Client-side state for one viewing session: the append-only raw buffer,
//! the reshaped table derived from it, parameter selection, and the time
//! window. Chart preparation turns the reshaped table into grouped series
//! for whatever renderer the frontend plugs in.

mod chart;
mod session;

pub use chart::{
    prepare_chart_groups, ChartGroup, ChartPoint, ChartRenderer, ChartSeries, ChartStyle,
};
pub use session::ViewSession;
