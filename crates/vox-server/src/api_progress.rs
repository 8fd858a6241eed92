//! Model load progress stream.

use crate::AppState;
use axum::{
    extract::Extension,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use futures_util::Stream;
use std::{convert::Infallible, sync::Arc, time::Duration};

/// Cadence of progress snapshots pushed to the client.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Handler for `GET /api/progress`.
///
/// Streams load progress snapshots as SSE data events. The first snapshot
/// is sent immediately, then one every 500ms; the stream ends after a
/// terminal snapshot (ready or error) so the client always sees the outcome
/// before the connection closes.
pub async fn get_progress_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let manager = state.manager.clone();

    let stream = futures_util::stream::unfold(
        (manager, false, true),
        |(manager, done, first)| async move {
            if done {
                return None;
            }
            if !first {
                tokio::time::sleep(POLL_INTERVAL).await;
            }

            let snapshot = manager.progress();
            let done = snapshot.status.is_terminal();
            let event = match serde_json::to_string(&snapshot) {
                Ok(data) => Event::default().data(data),
                Err(e) => {
                    tracing::error!("failed to serialize progress snapshot: {}", e);
                    Event::default().data("{}")
                }
            };

            Some((Ok(event), (manager, done, false)))
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}
