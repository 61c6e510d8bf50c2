//! Groundtrack API Server
//!
//! Run with: cargo run
//!
//! # Configuration
//!
//! Loaded from a TOML file (see [`groundtrack::config`]) with environment
//! overrides:
//! - `GROUNDTRACK_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `GROUNDTRACK_API_PORT`: Port to listen on (default: 4000)
//! - `GROUNDTRACK_SEED_FILE`: Telemetry file loaded at startup (optional)
//! - `GROUNDTRACK_SEED_COLLECTION`: Collection the seed loads into
//! - `GROUNDTRACK_LOG_LEVEL` / `GROUNDTRACK_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Overrides the log filter entirely

use std::sync::Arc;
use std::time::Duration;

use groundtrack::api::{serve, ApiConfig, AppState};
use groundtrack::config::Config;
use groundtrack::import;
use groundtrack::source::MemorySource;
use groundtrack::stream::{ChangeWatcher, StreamRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();

    init_tracing(&config);

    tracing::info!("Starting Groundtrack server v{}", env!("CARGO_PKG_VERSION"));

    let source = Arc::new(MemorySource::new());
    let registry = Arc::new(StreamRegistry::new());

    // Seed the store before the watcher connects so the documents show up
    // in fetches without racing the first watch cycle.
    if let Some(path) = &config.source.seed_file {
        let outcome = import::import_file(path)?;
        for warning in &outcome.warnings {
            tracing::warn!(seed_file = %path.display(), "{}", warning);
        }
        tracing::info!(
            seed_file = %path.display(),
            collection = %config.source.seed_collection,
            records = outcome.records.len(),
            skipped = outcome.rows_failed,
            "seed data loaded"
        );
        source
            .insert_batch(&config.source.seed_collection, outcome.records)
            .await;
    }

    let watcher = ChangeWatcher::new(
        Arc::clone(&source) as Arc<dyn groundtrack::source::TelemetrySource>,
        Arc::clone(&registry),
    )
    .with_backoff(Duration::from_secs(config.stream.retry_backoff_secs));
    watcher.spawn();

    let api_config = ApiConfig {
        host: config.api.host.clone(),
        port: config.api.port,
        fetch_limit: config.api.fetch_limit,
        keepalive: Duration::from_secs(config.stream.keepalive_secs),
    };

    tracing::info!("Starting server on {}", api_config.addr());
    let state = AppState::new(source, registry, api_config.clone());
    serve(state, &api_config).await?;

    tracing::info!("Groundtrack server stopped");
    Ok(())
}

/// Initialize tracing from config, honoring RUST_LOG when set
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "groundtrack={},tower_http=debug",
            config.logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
