//! Telemetry Fetch Routes
//!
//! - GET /telemetry?collection=<name> - Recent documents, as stored

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::CollectionQuery;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::telemetry::RawRecord;

/// GET /telemetry?collection=<name>
///
/// Up to `fetch_limit` documents from the collection, ordered by receipt
/// time ascending, exactly as stored. No derived fields are added here;
/// reshaping belongs to the viewing session.
pub async fn fetch_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CollectionQuery>,
) -> ApiResult<Json<Vec<RawRecord>>> {
    let collection = query
        .collection()
        .ok_or_else(|| ApiError::Validation("missing query parameter: collection".to_string()))?;

    let documents = state
        .source
        .fetch_recent(collection, state.config.fetch_limit)
        .await?;

    tracing::debug!(
        collection = %collection,
        documents = documents.len(),
        "telemetry fetch served"
    );

    Ok(Json(documents))
}
