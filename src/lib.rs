//! # Groundtrack
//!
//! Satellite telemetry console: a backend that serves stored telemetry
//! documents and streams live inserts, plus the client-side pipeline that
//! reshapes the flat record log into chart-ready series and insights.
//!
//! ## Features
//!
//! - **Live fan-out**: per-stream subscriber registry fed by a
//!   self-healing store watcher
//! - **Push channels**: SSE update channels with keepalive heartbeats and
//!   idempotent teardown
//! - **Reshaping**: wide per-timestamp table, display-ordered parameters,
//!   stable categorical ranks
//! - **Insights**: windowed min/max/mean and frequency summaries
//! - **Import**: CSV and JSON telemetry files shaped like store documents
//!
//! ## Modules
//!
//! - [`stream`]: fan-out registry, change watcher, update channels
//! - [`source`]: telemetry store abstraction and the in-memory store
//! - [`reshape`] / [`merge`] / [`insights`]: the viewing pipeline
//! - [`view`]: session state and chart preparation
//! - [`api`]: REST/SSE server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use groundtrack::api::{serve, ApiConfig, AppState};
//! use groundtrack::source::MemorySource;
//! use groundtrack::stream::{ChangeWatcher, StreamRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(MemorySource::new());
//!     let registry = Arc::new(StreamRegistry::new());
//!
//!     ChangeWatcher::new(source.clone(), Arc::clone(&registry)).spawn();
//!
//!     let config = ApiConfig::default();
//!     let state = AppState::new(source, registry, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod import;
pub mod insights;
pub mod merge;
pub mod reshape;
pub mod source;
pub mod stream;
pub mod telemetry;
pub mod view;

// Re-export top-level types for convenience
pub use telemetry::{ParamValue, RawRecord, RecordKey, TimeWindow};

pub use reshape::{reshape, CategoricalMap, CellValue, ParamKind, Reshaped, WideRow};

pub use merge::{merge, merge_all};

pub use insights::summarize;

pub use stream::{
    ChangeWatcher, ChannelError, RecordSink, StreamRegistry, SubscriptionHandle, UpdateChannel,
    UpdateFrame,
};

pub use source::{MemorySource, SourceError, TelemetrySource};

pub use view::{prepare_chart_groups, ChartGroup, ChartRenderer, ChartSeries, ViewSession};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig, SourceConfig, StreamConfig};

pub use import::{CsvImporter, FileImporter, ImportError, ImportOutcome, JsonImporter};
