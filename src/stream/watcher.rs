//! Change Watcher
//!
//! Long-lived background service: opens an insert watch on every known
//! collection and forwards each inserted document into the
//! [`StreamRegistry`]. Any failure (enumeration, watch setup, or a live
//! watch ending) tears the whole set down and starts over after a fixed
//! backoff, forever. Collections are re-enumerated on every attempt, so
//! streams created after startup get picked up without a restart.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time;

use crate::source::{SourceError, TelemetrySource};
use crate::stream::registry::StreamRegistry;

/// Fixed delay between (re)connect attempts. No growth, no cap: the store
/// coming back is the only thing that ends the wait.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Watches the store and feeds the registry.
pub struct ChangeWatcher {
    source: Arc<dyn TelemetrySource>,
    registry: Arc<StreamRegistry>,
    backoff: Duration,
}

impl ChangeWatcher {
    pub fn new(source: Arc<dyn TelemetrySource>, registry: Arc<StreamRegistry>) -> Self {
        Self {
            source,
            registry,
            backoff: RETRY_BACKOFF,
        }
    }

    /// Override the retry backoff (tests use short delays).
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run the watcher as a background task for the life of the process.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        loop {
            match self.watch_all().await {
                Ok(()) => {
                    tracing::debug!("watch cycle ended, re-enumerating collections");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "telemetry watch failed, retrying");
                }
            }
            time::sleep(self.backoff).await;
        }
    }

    /// One watch cycle: enumerate collections, watch them all, and return
    /// when any watch ends so the caller can back off and reconnect.
    async fn watch_all(&self) -> Result<(), SourceError> {
        let collections = self.source.collections().await?;
        if collections.is_empty() {
            // Nothing to watch yet; the backoff doubles as a poll interval
            // for the first collection to appear.
            return Ok(());
        }

        let mut watches = JoinSet::new();
        for name in collections {
            let watch = self.source.watch_inserts(&name).await?;
            tracing::info!(stream = %name, "insert watch opened");
            watches.spawn(forward_inserts(name, watch, Arc::clone(&self.registry)));
        }

        // Steady state parks here. One watch ending means the source-side
        // stream died; drop them all and reconnect fresh.
        if let Some(finished) = watches.join_next().await {
            match finished {
                Ok(stream) => tracing::warn!(stream = %stream, "insert watch ended"),
                Err(e) => tracing::warn!(error = %e, "insert watch task failed"),
            }
        }
        watches.abort_all();
        Ok(())
    }
}

/// Forward every document from one watch into the registry. Returns the
/// stream name when the watch ends.
async fn forward_inserts(
    stream: String,
    mut watch: crate::source::InsertWatch,
    registry: Arc<StreamRegistry>,
) -> String {
    while let Some(document) = watch.recv().await {
        registry.broadcast(&stream, Arc::new(document)).await;
    }
    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InsertWatch, MemorySource};
    use crate::telemetry::{ParamValue, RawRecord};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;

    fn record(time: f64) -> RawRecord {
        RawRecord::new(time, 1, "bus_voltage", ParamValue::Number(3.3))
    }

    #[tokio::test]
    async fn test_inserts_reach_subscribers() {
        let source = Arc::new(MemorySource::new());
        source.create_collection("eps").await;

        let registry = Arc::new(StreamRegistry::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.subscribe("eps", tx).await;

        let watcher = ChangeWatcher::new(source.clone(), Arc::clone(&registry))
            .with_backoff(Duration::from_millis(10));
        let handle = watcher.spawn();

        // The watcher connects asynchronously; keep inserting until a
        // forwarded copy comes through.
        let mut received = None;
        for attempt in 0..50 {
            source.insert("eps", record(attempt as f64)).await;
            if let Ok(Some(rec)) =
                time::timeout(Duration::from_millis(50), rx.recv()).await
            {
                received = Some(rec);
                break;
            }
        }

        assert!(received.is_some(), "no insert was forwarded");
        handle.abort();
    }

    /// Source that fails its first enumeration, then behaves.
    struct FlakySource {
        inner: MemorySource,
        failed_once: AtomicBool,
    }

    #[async_trait]
    impl TelemetrySource for FlakySource {
        async fn collections(&self) -> Result<Vec<String>, SourceError> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(SourceError::Unavailable("store not ready".to_string()));
            }
            self.inner.collections().await
        }

        async fn fetch_recent(
            &self,
            collection: &str,
            limit: usize,
        ) -> Result<Vec<RawRecord>, SourceError> {
            self.inner.fetch_recent(collection, limit).await
        }

        async fn watch_inserts(&self, collection: &str) -> Result<InsertWatch, SourceError> {
            self.inner.watch_inserts(collection).await
        }
    }

    #[tokio::test]
    async fn test_retries_after_enumeration_failure() {
        let inner = MemorySource::new();
        inner.create_collection("eps").await;
        let source = Arc::new(FlakySource {
            inner,
            failed_once: AtomicBool::new(false),
        });

        let registry = Arc::new(StreamRegistry::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.subscribe("eps", tx).await;

        let watcher = ChangeWatcher::new(source.clone(), Arc::clone(&registry))
            .with_backoff(Duration::from_millis(10));
        let handle = watcher.spawn();

        let mut received = None;
        for attempt in 0..50 {
            source.inner.insert("eps", record(attempt as f64)).await;
            if let Ok(Some(rec)) =
                time::timeout(Duration::from_millis(50), rx.recv()).await
            {
                received = Some(rec);
                break;
            }
        }

        assert!(
            received.is_some(),
            "watcher never recovered from the failed enumeration"
        );
        assert!(source.failed_once.load(Ordering::SeqCst));
        handle.abort();
    }
}
