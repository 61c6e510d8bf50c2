//! Live Update Routes
//!
//! - GET /telemetry/updates?collection=<name> - SSE channel of inserts
//!
//! Frames on the wire: one `data:` frame per broadcast document, a `:ping`
//! comment every keepalive interval. Consumers drop the comments.

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures_util::Stream;
use std::convert::Infallible;
use std::sync::Arc;

use crate::api::dto::CollectionQuery;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::stream::{UpdateChannel, UpdateFrame};

/// GET /telemetry/updates?collection=<name>
///
/// Opens an update channel on the collection. A missing or empty
/// `collection` is rejected with 400 before any channel state exists.
/// When the client disconnects, the dropped stream tears the channel down
/// and the registry forgets the subscriber.
pub async fn stream_updates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CollectionQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let collection = query
        .collection()
        .ok_or_else(|| ApiError::Validation("missing query parameter: collection".to_string()))?
        .to_string();

    let mut channel = UpdateChannel::open(
        Arc::clone(&state.registry),
        &collection,
        state.config.keepalive,
    )
    .await?;

    let frames = async_stream::stream! {
        while let Some(frame) = channel.next_frame().await {
            match frame {
                UpdateFrame::Data(record) => match Event::default().json_data(&*record) {
                    Ok(event) => yield Ok(event),
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize update frame");
                    }
                },
                UpdateFrame::Heartbeat => {
                    yield Ok(Event::default().comment("ping"));
                }
            }
        }
    };

    Ok(Sse::new(frames))
}
