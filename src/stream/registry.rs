//! Stream Registry
//!
//! Tracks, per logical stream name, the set of active subscriber sinks.
//! Broadcasts and subscription changes arrive concurrently from the watch
//! tasks and the channel handlers; a `RwLock` around the stream map keeps
//! the sets consistent without a single-writer discipline.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::telemetry::RawRecord;

/// Sink a subscriber receives broadcast records on.
///
/// Unbounded so a slow consumer never blocks the watch path; per-sink
/// delivery order matches broadcast order.
pub type RecordSink = mpsc::UnboundedSender<Arc<RawRecord>>;

/// Proof of a registration, consumed by `unsubscribe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    stream: String,
    id: Uuid,
}

impl SubscriptionHandle {
    /// The stream this subscription belongs to.
    pub fn stream(&self) -> &str {
        &self.stream
    }
}

/// Per-stream subscriber sets with broadcast.
#[derive(Default)]
pub struct StreamRegistry {
    streams: RwLock<HashMap<String, HashMap<Uuid, RecordSink>>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sink` under `stream`, creating the stream's subscriber set
    /// if this is its first subscriber.
    pub async fn subscribe(&self, stream: &str, sink: RecordSink) -> SubscriptionHandle {
        let id = Uuid::new_v4();
        self.streams
            .write()
            .await
            .entry(stream.to_string())
            .or_default()
            .insert(id, sink);

        tracing::info!(stream = %stream, subscriber = %id, "subscriber registered");
        SubscriptionHandle {
            stream: stream.to_string(),
            id,
        }
    }

    /// Remove the handle's sink from its stream. When the last subscriber
    /// leaves, the stream entry is dropped entirely; no empty sets linger.
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let mut streams = self.streams.write().await;
        if let Some(subscribers) = streams.get_mut(&handle.stream) {
            subscribers.remove(&handle.id);
            if subscribers.is_empty() {
                streams.remove(&handle.stream);
            }
        }

        tracing::info!(stream = %handle.stream, subscriber = %handle.id, "subscriber removed");
    }

    /// Deliver `record` to every current subscriber of `stream`.
    ///
    /// A failed delivery is logged and skipped; it neither aborts delivery
    /// to the remaining subscribers nor removes the sink. Removal only
    /// happens through `unsubscribe`, driven by the transport's own close
    /// signal.
    pub async fn broadcast(&self, stream: &str, record: Arc<RawRecord>) {
        let streams = self.streams.read().await;
        let Some(subscribers) = streams.get(stream) else {
            return;
        };

        let mut delivered = 0;
        for (id, sink) in subscribers {
            match sink.send(Arc::clone(&record)) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        stream = %stream,
                        subscriber = %id,
                        error = %e,
                        "delivery failed, sink kept for explicit unsubscribe"
                    );
                }
            }
        }

        tracing::trace!(stream = %stream, delivered, "record broadcast");
    }

    /// Number of active subscribers on `stream`.
    pub async fn subscriber_count(&self, stream: &str) -> usize {
        self.streams
            .read()
            .await
            .get(stream)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Number of streams with at least one subscriber.
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Whether a stream currently has an entry in the registry.
    pub async fn has_stream(&self, stream: &str) -> bool {
        self.streams.read().await.contains_key(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::ParamValue;

    fn record() -> Arc<RawRecord> {
        Arc::new(RawRecord::new(100.0, 1, "bus_voltage", ParamValue::Number(3.3)))
    }

    #[tokio::test]
    async fn test_subscribe_broadcast_receive() {
        let registry = StreamRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = registry.subscribe("eps", tx).await;
        registry.broadcast("eps", record()).await;

        let received = rx.try_recv().unwrap();
        assert_eq!(received.parameter, "bus_voltage");

        registry.unsubscribe(&handle).await;
    }

    #[tokio::test]
    async fn test_broadcast_scoped_to_stream() {
        let registry = StreamRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        registry.subscribe("uhf", tx).await;
        registry.broadcast("eps", record()).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_affect_other_subscribers() {
        let registry = StreamRegistry::new();

        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        registry.subscribe("s1", tx_a).await;
        registry.subscribe("s1", tx_b).await;

        // A's receiver is gone, so delivery to A fails.
        drop(rx_a);
        registry.broadcast("s1", record()).await;

        assert!(rx_b.try_recv().is_ok(), "B must still receive the record");
        // The failed sink stays registered until an explicit unsubscribe.
        assert_eq!(registry.subscriber_count("s1").await, 2);
    }

    #[tokio::test]
    async fn test_last_unsubscribe_drops_stream_entry() {
        let registry = StreamRegistry::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();

        let a = registry.subscribe("eps", tx_a).await;
        let b = registry.subscribe("eps", tx_b).await;
        assert_eq!(registry.subscriber_count("eps").await, 2);

        registry.unsubscribe(&a).await;
        assert!(registry.has_stream("eps").await);

        registry.unsubscribe(&b).await;
        assert!(!registry.has_stream("eps").await);
        assert_eq!(registry.stream_count().await, 0);
    }

    #[tokio::test]
    async fn test_per_subscriber_order_preserved() {
        let registry = StreamRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.subscribe("eps", tx).await;

        for time in [1.0, 2.0, 3.0] {
            let rec = Arc::new(RawRecord::new(time, 1, "bus_voltage", ParamValue::Number(time)));
            registry.broadcast("eps", rec).await;
        }

        let times: Vec<f64> = (0..3).map(|_| rx.try_recv().unwrap().tm_received_time).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }
}
