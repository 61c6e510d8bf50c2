//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks. The fan-out
//! registry is injected here so the request path and the change watcher
//! broadcast through the same instance.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::source::TelemetrySource;
use crate::stream::{StreamRegistry, KEEPALIVE_INTERVAL};

/// Shared application state for all handlers
pub struct AppState {
    /// Telemetry document store
    pub source: Arc<dyn TelemetrySource>,
    /// Fan-out registry shared with the change watcher
    pub registry: Arc<StreamRegistry>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        registry: Arc<StreamRegistry>,
        config: ApiConfig,
    ) -> Self {
        Self {
            source,
            registry,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum documents returned by a telemetry fetch
    pub fetch_limit: usize,
    /// Heartbeat interval on update channels
    pub keepalive: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            fetch_limit: 1000,
            keepalive: KEEPALIVE_INTERVAL,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
