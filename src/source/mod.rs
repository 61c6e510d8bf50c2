//! Telemetry Source
//!
//! Abstracts the underlying telemetry document store. The server only needs
//! three capabilities: enumerate collections, fetch recent documents, and
//! watch a collection for inserts. Anything that can do those three
//! (a document database, a log tailer, the bundled in-memory store) plugs
//! in behind [`TelemetrySource`].

mod memory;

pub use memory::MemorySource;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::telemetry::RawRecord;

/// Receiver side of an insert watch. The stream ends when the watch dies;
/// the [`ChangeWatcher`](crate::stream::ChangeWatcher) treats that as a
/// signal to reconnect.
pub type InsertWatch = mpsc::UnboundedReceiver<RawRecord>;

/// Errors from the telemetry store.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The store (or its watch capability) is not reachable right now.
    /// Treated as transient: watchers retry, requests surface 503.
    #[error("telemetry source unavailable: {0}")]
    Unavailable(String),
}

/// The store's query/subscribe surface.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Names of the known collections (logical streams).
    async fn collections(&self) -> Result<Vec<String>, SourceError>;

    /// Up to `limit` documents from `collection`, ordered by receipt time
    /// ascending, exactly as stored. Unknown collections yield an empty
    /// list, matching document-store semantics.
    async fn fetch_recent(
        &self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<RawRecord>, SourceError>;

    /// Open a continuous watch on documents inserted into `collection`.
    async fn watch_inserts(&self, collection: &str) -> Result<InsertWatch, SourceError>;
}
