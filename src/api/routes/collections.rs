//! Collection Routes
//!
//! - GET /collections - List known stream names

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::CollectionsResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /collections
///
/// Lists the collections (logical streams) the source knows about.
pub async fn list_collections(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CollectionsResponse>> {
    let collections = state.source.collections().await?;
    Ok(Json(CollectionsResponse { collections }))
}
