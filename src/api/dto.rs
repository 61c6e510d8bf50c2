//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::telemetry::RawRecord;

// ============================================
// COLLECTION DTOs
// ============================================

/// Response listing the known stream names
#[derive(Debug, Serialize)]
pub struct CollectionsResponse {
    pub collections: Vec<String>,
}

// ============================================
// TELEMETRY DTOs
// ============================================

/// Query string for telemetry fetches and update channels
#[derive(Debug, Deserialize)]
pub struct CollectionQuery {
    /// Collection (stream) name; required, validated in the handler so the
    /// rejection is a 400 rather than a generic extractor failure
    #[serde(default)]
    pub collection: Option<String>,
}

impl CollectionQuery {
    /// The collection name, if present and non-empty.
    pub fn collection(&self) -> Option<&str> {
        self.collection
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

// ============================================
// NOTIFY DTOs
// ============================================

/// External ingestion push: broadcast these documents to subscribers
#[derive(Debug, Deserialize)]
pub struct NotifyUpdateRequest {
    /// Target stream
    #[serde(default)]
    pub collection: Option<String>,
    /// Documents to broadcast, one frame each
    #[serde(default)]
    pub data: Option<Vec<RawRecord>>,
}

/// Acknowledgment for a notify push
#[derive(Debug, Serialize)]
pub struct NotifyUpdateResponse {
    pub success: bool,
    /// Number of documents broadcast
    pub broadcast: usize,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Telemetry source status: "ok" or "error"
    pub source: String,
    /// Streams with at least one live subscriber
    pub active_streams: usize,
    /// Seconds since server start
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
