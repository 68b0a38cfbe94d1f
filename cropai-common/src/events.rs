//! Session event types and the EventBus
//!
//! Every state transition of a session's view state is announced on the
//! EventBus. Browsers subscribe over SSE and re-render when an event for
//! their own session arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// CropAI event types
///
/// Serialized with a `type` tag for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CropEvent {
    /// An image was accepted and a prediction call issued
    AnalysisStarted {
        session_id: Uuid,
        /// Epoch of the analysis cycle
        epoch: u64,
        timestamp: DateTime<Utc>,
    },

    /// Prediction call resolved and predictions are visible
    AnalysisCompleted {
        session_id: Uuid,
        prediction_count: usize,
        /// Top-ranked label, if any
        top_disease: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Prediction call failed; the generic error message is visible
    AnalysisFailed {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A prediction result arrived after its cycle was reset and was dropped
    AnalysisDiscarded {
        session_id: Uuid,
        epoch: u64,
        timestamp: DateTime<Utc>,
    },

    /// Session returned to Idle
    SessionReset {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// History list replaced from the store
    HistoryRefreshed {
        session_id: Uuid,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// Active screen changed
    ScreenChanged {
        session_id: Uuid,
        screen: String,
        timestamp: DateTime<Utc>,
    },

    /// User signed in or out
    AuthChanged {
        session_id: Uuid,
        signed_in: bool,
        timestamp: DateTime<Utc>,
    },
}

impl CropEvent {
    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            CropEvent::AnalysisStarted { session_id, .. }
            | CropEvent::AnalysisCompleted { session_id, .. }
            | CropEvent::AnalysisFailed { session_id, .. }
            | CropEvent::AnalysisDiscarded { session_id, .. }
            | CropEvent::SessionReset { session_id, .. }
            | CropEvent::HistoryRefreshed { session_id, .. }
            | CropEvent::ScreenChanged { session_id, .. }
            | CropEvent::AuthChanged { session_id, .. } => *session_id,
        }
    }

    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            CropEvent::AnalysisStarted { .. } => "AnalysisStarted",
            CropEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            CropEvent::AnalysisFailed { .. } => "AnalysisFailed",
            CropEvent::AnalysisDiscarded { .. } => "AnalysisDiscarded",
            CropEvent::SessionReset { .. } => "SessionReset",
            CropEvent::HistoryRefreshed { .. } => "HistoryRefreshed",
            CropEvent::ScreenChanged { .. } => "ScreenChanged",
            CropEvent::AuthChanged { .. } => "AuthChanged",
        }
    }
}

/// Central event distribution bus
///
/// Wraps tokio::broadcast:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use cropai_common::events::{CropEvent, EventBus};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(CropEvent::SessionReset {
///     session_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CropEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CropEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: CropEvent) -> Result<usize, broadcast::error::SendError<CropEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CropEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
