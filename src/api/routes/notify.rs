//! Notify Routes
//!
//! - POST /notify-update - External ingestion push
//!
//! Lets an ingestion process (log parser, replay tool) broadcast documents
//! to live subscribers without going through the store's insert-watch path.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{NotifyUpdateRequest, NotifyUpdateResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /notify-update
///
/// Broadcasts each document in `data` to the collection's subscribers.
/// Both fields are required; the push is acknowledged even when nobody is
/// subscribed (the broadcast is simply a no-op then).
pub async fn notify_update(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NotifyUpdateRequest>,
) -> ApiResult<Json<NotifyUpdateResponse>> {
    let collection = request
        .collection
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("missing field: collection".to_string()))?;

    let data = request
        .data
        .as_ref()
        .ok_or_else(|| ApiError::Validation("missing field: data".to_string()))?;

    for document in data {
        state
            .registry
            .broadcast(collection, Arc::new(document.clone()))
            .await;
    }

    tracing::debug!(
        collection = %collection,
        documents = data.len(),
        "external update broadcast"
    );

    Ok(Json(NotifyUpdateResponse {
        success: true,
        broadcast: data.len(),
    }))
}
