//! Live Update Streaming
//!
//! Fans live telemetry inserts out to viewing sessions.
//!
//! ## Architecture
//!
//! - **StreamRegistry**: per-stream subscriber sets with broadcast
//! - **ChangeWatcher**: background task watching the store for inserts and
//!   forwarding them into the registry
//! - **UpdateChannel**: per-subscriber push channel yielding data frames
//!   and periodic keepalive heartbeats
//!
//! The registry is an injectable instance constructed once in `main` and
//! shared by the watcher and every channel; there is no process-global
//! state, so tests run independent registries side by side.

mod channel;
mod registry;
mod watcher;

pub use channel::{ChannelError, UpdateChannel, UpdateFrame, KEEPALIVE_INTERVAL};
pub use registry::{RecordSink, StreamRegistry, SubscriptionHandle};
pub use watcher::{ChangeWatcher, RETRY_BACKOFF};
