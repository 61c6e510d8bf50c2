//! In-Memory Telemetry Store
//!
//! The bundled [`TelemetrySource`] implementation: collections live in a
//! map, inserts fan out over a broadcast channel per collection. Carries
//! the server binary, seeding, and every test that needs a live store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, RwLock};

use super::{InsertWatch, SourceError, TelemetrySource};
use crate::telemetry::RawRecord;

const INSERT_CHANNEL_CAPACITY: usize = 256;

struct CollectionState {
    documents: Vec<RawRecord>,
    inserts: broadcast::Sender<RawRecord>,
}

impl CollectionState {
    fn new() -> Self {
        let (inserts, _) = broadcast::channel(INSERT_CHANNEL_CAPACITY);
        Self {
            documents: Vec::new(),
            inserts,
        }
    }
}

impl Default for CollectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process document store with insert-watch support.
#[derive(Default)]
pub struct MemorySource {
    collections: RwLock<HashMap<String, CollectionState>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection if it does not exist yet.
    pub async fn create_collection(&self, name: &str) {
        self.collections
            .write()
            .await
            .entry(name.to_string())
            .or_default();
    }

    /// Append one document and notify watchers. Creates the collection on
    /// first insert.
    pub async fn insert(&self, collection: &str, record: RawRecord) {
        let mut collections = self.collections.write().await;
        let state = collections.entry(collection.to_string()).or_default();
        // Send errors just mean nobody is watching yet.
        let _ = state.inserts.send(record.clone());
        state.documents.push(record);
    }

    /// Append a batch of documents, notifying watchers per document.
    pub async fn insert_batch(&self, collection: &str, records: Vec<RawRecord>) {
        for record in records {
            self.insert(collection, record).await;
        }
    }

    /// Number of documents stored in `collection`.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|state| state.documents.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl TelemetrySource for MemorySource {
    async fn collections(&self) -> Result<Vec<String>, SourceError> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn fetch_recent(
        &self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<RawRecord>, SourceError> {
        let collections = self.collections.read().await;
        let Some(state) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut documents = state.documents.clone();
        documents.sort_by(|a, b| a.tm_received_time.total_cmp(&b.tm_received_time));
        documents.truncate(limit);
        Ok(documents)
    }

    async fn watch_inserts(&self, collection: &str) -> Result<InsertWatch, SourceError> {
        let mut collections = self.collections.write().await;
        let state = collections.entry(collection.to_string()).or_default();
        let mut inserts = state.inserts.subscribe();
        drop(collections);

        let (tx, rx) = mpsc::unbounded_channel();
        let name = collection.to_string();
        tokio::spawn(async move {
            loop {
                match inserts.recv().await {
                    Ok(record) => {
                        if tx.send(record).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(collection = %name, skipped, "insert watch lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(rx)
    }
}
