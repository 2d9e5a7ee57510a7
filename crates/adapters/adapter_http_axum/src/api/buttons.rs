//! Server-Sent Events (SSE) stream of button events.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use switchhub_app::ports::SwitchCollection;

use crate::state::AppState;

/// `GET /api/buttons/events` — SSE stream of debounced button events.
///
/// Each event is sent as a JSON `data:` frame, with the event kind
/// (`press` / `release`) as the SSE event name. The stream continues until
/// the client disconnects.
pub async fn stream<C>(
    State(state): State<AppState<C>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    C: SwitchCollection + 'static,
{
    let event_rx = state.event_bus.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().event(event.kind.to_string()).data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize button event for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, oldest button events dropped");
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
