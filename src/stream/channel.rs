//! Update Channel
//!
//! Per-subscriber push channel between a broadcast stream and one client
//! transport. A channel is `OPEN` from a successful [`UpdateChannel::open`]
//! until its transport closes, then terminally `CLOSED`.
//!
//! While open it yields frames from a select over three signals: the next
//! broadcast record, the next keepalive tick, and the close of its sink.
//! Teardown (stop keepalive, unsubscribe from the registry) runs exactly
//! once no matter how many times close fires or whether the channel is
//! simply dropped by a disconnecting transport.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::stream::registry::{StreamRegistry, SubscriptionHandle};
use crate::telemetry::RawRecord;

/// How often an idle channel pushes a heartbeat frame.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// One frame pushed to the client.
#[derive(Debug, Clone)]
pub enum UpdateFrame {
    /// A broadcast telemetry document.
    Data(Arc<RawRecord>),
    /// No-op liveness signal; consumers ignore it.
    Heartbeat,
}

/// Errors opening an update channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The request named no stream; rejected before any state is created.
    #[error("missing or empty stream name")]
    MissingStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    Open,
    Closed,
}

/// A live subscription to one stream, owned by a single transport.
pub struct UpdateChannel {
    registry: Arc<StreamRegistry>,
    handle: Option<SubscriptionHandle>,
    rx: mpsc::UnboundedReceiver<Arc<RawRecord>>,
    keepalive: Interval,
    state: ChannelState,
}

impl UpdateChannel {
    /// Open a channel on `stream`, registering with the registry and
    /// starting the keepalive timer.
    pub async fn open(
        registry: Arc<StreamRegistry>,
        stream: &str,
        keepalive: Duration,
    ) -> Result<Self, ChannelError> {
        if stream.trim().is_empty() {
            return Err(ChannelError::MissingStream);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = registry.subscribe(stream, tx).await;

        // First tick lands one full interval out; the channel opens silent.
        let mut interval = time::interval_at(Instant::now() + keepalive, keepalive);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(stream = %stream, "update channel opened");

        Ok(Self {
            registry,
            handle: Some(handle),
            rx,
            keepalive: interval,
            state: ChannelState::Open,
        })
    }

    /// Wait for the next frame to push.
    ///
    /// Returns `None` once the channel is closed; callers treat that as the
    /// end of the transport stream.
    pub async fn next_frame(&mut self) -> Option<UpdateFrame> {
        if self.state == ChannelState::Closed {
            return None;
        }

        tokio::select! {
            received = self.rx.recv() => match received {
                Some(record) => Some(UpdateFrame::Data(record)),
                None => {
                    self.close().await;
                    None
                }
            },
            _ = self.keepalive.tick() => Some(UpdateFrame::Heartbeat),
        }
    }

    /// Tear the channel down: unsubscribe and stop yielding frames.
    ///
    /// Idempotent; the registry is touched at most once.
    pub async fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::info!(stream = %handle.stream(), "update channel closed");
            self.registry.unsubscribe(&handle).await;
        }
        self.state = ChannelState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.state == ChannelState::Closed
    }
}

impl Drop for UpdateChannel {
    fn drop(&mut self) {
        // A disconnecting transport drops the channel mid-stream; finish
        // the unsubscribe from a task since Drop cannot await. After an
        // explicit close the handle is already gone and this is a no-op.
        if let Some(handle) = self.handle.take() {
            let registry = Arc::clone(&self.registry);
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    registry.unsubscribe(&handle).await;
                });
            } else {
                tracing::warn!(
                    stream = %handle.stream(),
                    "channel dropped outside a runtime, subscription leaked"
                );
            }
        }
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
    async fn test_open_rejects_missing_stream() {
        let registry = Arc::new(StreamRegistry::new());

        let result = UpdateChannel::open(Arc::clone(&registry), "  ", KEEPALIVE_INTERVAL).await;
        assert!(matches!(result, Err(ChannelError::MissingStream)));
        // Rejected before any channel state was created.
        assert_eq!(registry.stream_count().await, 0);
    }

    #[tokio::test]
    async fn test_data_frame_delivery() {
        let registry = Arc::new(StreamRegistry::new());
        let mut channel = UpdateChannel::open(Arc::clone(&registry), "eps", KEEPALIVE_INTERVAL)
            .await
            .unwrap();

        registry.broadcast("eps", record()).await;

        match channel.next_frame().await {
            Some(UpdateFrame::Data(rec)) => assert_eq!(rec.parameter, "bus_voltage"),
            other => panic!("expected data frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_heartbeat_when_idle() {
        let registry = Arc::new(StreamRegistry::new());
        let mut channel = UpdateChannel::open(registry, "eps", Duration::from_millis(10))
            .await
            .unwrap();

        match channel.next_frame().await {
            Some(UpdateFrame::Heartbeat) => {}
            other => panic!("expected heartbeat, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let registry = Arc::new(StreamRegistry::new());
        let mut channel = UpdateChannel::open(Arc::clone(&registry), "eps", KEEPALIVE_INTERVAL)
            .await
            .unwrap();
        assert_eq!(registry.subscriber_count("eps").await, 1);

        channel.close().await;
        channel.close().await;

        assert!(channel.is_closed());
        assert!(channel.next_frame().await.is_none());
        assert!(!registry.has_stream("eps").await);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let registry = Arc::new(StreamRegistry::new());
        let channel = UpdateChannel::open(Arc::clone(&registry), "eps", KEEPALIVE_INTERVAL)
            .await
            .unwrap();
        assert_eq!(registry.subscriber_count("eps").await, 1);

        drop(channel);
        // Teardown runs on a spawned task; yield until it lands.
        for _ in 0..10 {
            if !registry.has_stream("eps").await {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(!registry.has_stream("eps").await);
    }

    #[tokio::test]
    async fn test_frames_arrive_in_broadcast_order() {
        let registry = Arc::new(StreamRegistry::new());
        let mut channel = UpdateChannel::open(Arc::clone(&registry), "eps", KEEPALIVE_INTERVAL)
            .await
            .unwrap();

        for time in [1.0, 2.0, 3.0] {
            let rec = Arc::new(RawRecord::new(time, 1, "bus_voltage", ParamValue::Number(time)));
            registry.broadcast("eps", rec).await;
        }

        for expected in [1.0, 2.0, 3.0] {
            match channel.next_frame().await {
                Some(UpdateFrame::Data(rec)) => assert_eq!(rec.tm_received_time, expected),
                other => panic!("expected data frame, got {:?}", other),
            }
        }
    }
}
