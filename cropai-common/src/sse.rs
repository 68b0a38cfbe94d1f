//! Server-Sent Events (SSE) utilities

use crate::events::{CropEvent, EventBus};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Heartbeat interval for idle SSE connections
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Convert an event into an SSE frame (event name = variant, data = JSON)
pub fn to_sse_event(event: &CropEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(data) => Event::default().event(event.event_type()).data(data),
        Err(e) => {
            warn!("Failed to serialize {} for SSE: {}", event.event_type(), e);
            Event::default().comment("serialization error")
        }
    }
}

/// SSE stream of the events belonging to one session
///
/// Sends an initial `ConnectionStatus` frame, then forwards matching events
/// from the bus. Lagged receivers skip ahead; the stream ends when the bus
/// is dropped.
pub fn session_event_stream(
    bus: &EventBus,
    session_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = bus.subscribe();
    info!("SSE client connected for session {}", session_id);

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if event.session_id() == session_id {
                        yield Ok(to_sse_event(&event));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("SSE client for {} lagged, skipped {} events", session_id, skipped);
                }
                Err(RecvError::Closed) => {
                    info!("Event bus closed, ending SSE stream for {}", session_id);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}
