//! View-State Orchestrator
//!
//! Owns the one mutable [`SessionViewState`] of a browser session and drives
//! every transition of an analysis cycle:
//!
//! ```text
//!            begin_analysis                run_analysis (ok)
//!   Idle ───────────────────▶ Submitted ─────────────────────▶ Completed
//!    ▲                           │       run_analysis (err)
//!    │          reset            └──────────────────────────▶ Failed
//!    └──────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one analysis is in flight per session: `begin_analysis` rejects
//! new submissions while `is_analyzing` is set. Every cycle carries an epoch;
//! `reset` bumps it so a prediction that lands afterwards is discarded
//! instead of being applied to a session that has moved on.
//!
//! Remote failures never escape: prediction failures become the fixed
//! user-facing message, persistence failures are logged and leave the
//! state untouched.

use crate::services::{ImageUpload, PersistenceService, PredictionService};
use axum::body::Bytes;
use chrono::Utc;
use cropai_common::events::{CropEvent, EventBus};
use cropai_common::models::{AnalysisRecord, NewAnalysisRecord, Prediction};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Message shown when the prediction call fails
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze image. Please try again.";

/// Display-only reference to the selected image
///
/// Resolves to the stored bytes until the cycle is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ImageHandle(Uuid);

impl ImageHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Top-level screen of the application shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Analyze,
    LearnMore,
    Library,
    Dashboard,
}

impl Screen {
    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Analyze => "analyze",
            Screen::LearnMore => "learn_more",
            Screen::Library => "library",
            Screen::Dashboard => "dashboard",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "analyze" => Some(Screen::Analyze),
            "learn_more" => Some(Screen::LearnMore),
            "library" => Some(Screen::Library),
            "dashboard" => Some(Screen::Dashboard),
            _ => None,
        }
    }
}

/// Where the current analysis cycle stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    Idle,
    Submitted,
    Completed,
    Failed,
}

/// Everything the views render for one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionViewState {
    pub selected_image: Option<ImageHandle>,
    pub predictions: Vec<Prediction>,
    pub is_analyzing: bool,
    pub error: Option<String>,
    pub history: Vec<AnalysisRecord>,
    pub active_screen: Screen,
}

impl Default for SessionViewState {
    fn default() -> Self {
        Self {
            selected_image: None,
            predictions: Vec::new(),
            is_analyzing: false,
            error: None,
            history: Vec::new(),
            active_screen: Screen::Analyze,
        }
    }
}

impl SessionViewState {
    pub fn phase(&self) -> AnalysisPhase {
        if self.selected_image.is_none() {
            AnalysisPhase::Idle
        } else if self.is_analyzing {
            AnalysisPhase::Submitted
        } else if self.error.is_some() {
            AnalysisPhase::Failed
        } else {
            AnalysisPhase::Completed
        }
    }

    /// Highest-confidence prediction, if any
    pub fn top_prediction(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    /// Clear the per-cycle fields, keeping history and screen
    fn clear_cycle(&mut self) {
        self.selected_image = None;
        self.predictions.clear();
        self.is_analyzing = false;
        self.error = None;
    }
}

/// Why a submission was refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    #[error("No image file provided")]
    EmptyImage,

    #[error("Unsupported file type: {0}")]
    NotAnImage(String),
}

impl ImageUpload {
    /// Reject empty payloads and anything that is not `image/*`
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.bytes.is_empty() {
            return Err(SubmitError::EmptyImage);
        }
        if !self.content_type.starts_with("image/") {
            return Err(SubmitError::NotAnImage(self.content_type.clone()));
        }
        Ok(())
    }
}

/// Permission to run the prediction call for one accepted submission
#[derive(Debug)]
pub struct AnalysisTicket {
    epoch: u64,
    image: ImageUpload,
}

impl AnalysisTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// How `run_analysis` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Predictions applied; `record_saved` tells whether the history insert succeeded
    Completed {
        prediction_count: usize,
        record_saved: bool,
    },
    /// Prediction call failed; error message applied
    Failed,
    /// Session was reset while the call was in flight; nothing applied
    Discarded,
}

/// Image bytes held while the handle is live
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub handle: ImageHandle,
    pub content_type: String,
    pub bytes: Bytes,
}

struct Inner {
    view: SessionViewState,
    epoch: u64,
    image: Option<StoredImage>,
    /// Sequence of the latest history fetch started
    history_requested: u64,
    /// Sequence of the fetch whose result is in `view.history`
    history_applied: u64,
}

/// Per-session state machine
pub struct Orchestrator {
    session_id: Uuid,
    predictor: Arc<dyn PredictionService>,
    store: Arc<dyn PersistenceService>,
    events: EventBus,
    inner: RwLock<Inner>,
}

impl Orchestrator {
    pub fn new(
        session_id: Uuid,
        predictor: Arc<dyn PredictionService>,
        store: Arc<dyn PersistenceService>,
        events: EventBus,
    ) -> Self {
        Self {
            session_id,
            predictor,
            store,
            events,
            inner: RwLock::new(Inner {
                view: SessionViewState::default(),
                epoch: 0,
                image: None,
                history_requested: 0,
                history_applied: 0,
            }),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Copy of the current view state
    pub async fn snapshot(&self) -> SessionViewState {
        self.inner.read().await.view.clone()
    }

    /// Bytes behind a live image handle
    pub async fn image(&self, handle: ImageHandle) -> Option<StoredImage> {
        let inner = self.inner.read().await;
        inner
            .image
            .as_ref()
            .filter(|img| img.handle == handle)
            .cloned()
    }

    /// Fetch the full history and replace the cached list
    ///
    /// On failure the last known value stays in place. Fetches can overlap
    /// when cycles complete back to back; a response older than the one
    /// already applied is dropped. Returns whether the list was replaced.
    pub async fn load_history(&self) -> bool {
        let seq = {
            let mut inner = self.inner.write().await;
            inner.history_requested += 1;
            inner.history_requested
        };

        match self.store.list_history().await {
            Ok(records) => {
                let total = records.len();
                {
                    let mut inner = self.inner.write().await;
                    if seq < inner.history_applied {
                        debug!(
                            "Session {} dropped stale history fetch {} (newer {} applied)",
                            self.session_id, seq, inner.history_applied
                        );
                        return false;
                    }
                    inner.history_applied = seq;
                    inner.view.history = records;
                }
                debug!("Session {} history refreshed ({} records)", self.session_id, total);
                self.events.emit_lossy(CropEvent::HistoryRefreshed {
                    session_id: self.session_id,
                    total,
                    timestamp: Utc::now(),
                });
                true
            }
            Err(e) => {
                warn!("Failed to load history for session {}: {}", self.session_id, e);
                false
            }
        }
    }

    /// Accept an image and enter Submitted
    ///
    /// Rejected while another analysis is in flight.
    pub async fn begin_analysis(&self, upload: ImageUpload) -> Result<AnalysisTicket, SubmitError> {
        upload.validate()?;

        let mut inner = self.inner.write().await;
        if inner.view.is_analyzing {
            debug!("Session {} rejected submission: analysis in progress", self.session_id);
            return Err(SubmitError::AnalysisInProgress);
        }

        let handle = ImageHandle::new();
        inner.image = Some(StoredImage {
            handle,
            content_type: upload.content_type.clone(),
            bytes: upload.bytes.clone(),
        });
        inner.view.selected_image = Some(handle);
        inner.view.predictions.clear();
        inner.view.error = None;
        inner.view.is_analyzing = true;
        inner.epoch += 1;
        let epoch = inner.epoch;
        drop(inner);

        info!(
            "Session {} analysis {} started for {}",
            self.session_id, epoch, upload.file_name
        );
        self.events.emit_lossy(CropEvent::AnalysisStarted {
            session_id: self.session_id,
            epoch,
            timestamp: Utc::now(),
        });

        Ok(AnalysisTicket {
            epoch,
            image: upload,
        })
    }

    /// Issue the prediction call for an accepted submission and apply the result
    pub async fn run_analysis(&self, ticket: AnalysisTicket) -> AnalysisOutcome {
        let result = self.predictor.predict(&ticket.image).await;

        let mut inner = self.inner.write().await;
        if inner.epoch != ticket.epoch {
            drop(inner);
            info!(
                "Session {} discarded late result for analysis {}",
                self.session_id, ticket.epoch
            );
            self.events.emit_lossy(CropEvent::AnalysisDiscarded {
                session_id: self.session_id,
                epoch: ticket.epoch,
                timestamp: Utc::now(),
            });
            return AnalysisOutcome::Discarded;
        }

        match result {
            Ok(predictions) => {
                let prediction_count = predictions.len();
                let new_record = predictions.first().map(NewAnalysisRecord::from);
                inner.view.predictions = predictions;
                inner.view.is_analyzing = false;
                inner.view.error = None;
                drop(inner);

                info!(
                    "Session {} analysis {} completed with {} predictions",
                    self.session_id, ticket.epoch, prediction_count
                );
                self.events.emit_lossy(CropEvent::AnalysisCompleted {
                    session_id: self.session_id,
                    prediction_count,
                    top_disease: new_record.as_ref().map(|r| r.disease_detected.clone()),
                    timestamp: Utc::now(),
                });

                let record_saved = match new_record {
                    Some(record) => self.save_and_refresh(&record).await,
                    None => false,
                };

                AnalysisOutcome::Completed {
                    prediction_count,
                    record_saved,
                }
            }
            Err(e) => {
                inner.view.predictions.clear();
                inner.view.is_analyzing = false;
                inner.view.error = Some(ANALYSIS_FAILED_MESSAGE.to_string());
                drop(inner);

                error!(
                    "Session {} analysis {} failed: {}",
                    self.session_id, ticket.epoch, e
                );
                self.events.emit_lossy(CropEvent::AnalysisFailed {
                    session_id: self.session_id,
                    timestamp: Utc::now(),
                });
                AnalysisOutcome::Failed
            }
        }
    }

    /// `begin_analysis` followed by `run_analysis`
    pub async fn submit(&self, upload: ImageUpload) -> Result<AnalysisOutcome, SubmitError> {
        let ticket = self.begin_analysis(upload).await?;
        Ok(self.run_analysis(ticket).await)
    }

    /// Persist the top prediction, then replace history from the store
    async fn save_and_refresh(&self, record: &NewAnalysisRecord) -> bool {
        match self.store.insert_analysis(record).await {
            Ok(_) => {
                self.load_history().await;
                true
            }
            Err(e) => {
                error!(
                    "Session {} failed to save analysis of {}: {}",
                    self.session_id, record.disease_detected, e
                );
                false
            }
        }
    }

    /// Return to Idle, releasing the image handle
    ///
    /// Allowed from any non-Idle phase, including while a prediction is in
    /// flight. Returns false when the session was already Idle.
    pub async fn reset(&self) -> bool {
        let mut inner = self.inner.write().await;
        if inner.view.phase() == AnalysisPhase::Idle {
            return false;
        }

        if let Some(image) = inner.image.take() {
            debug!("Session {} released image {}", self.session_id, image.handle);
        }
        inner.view.clear_cycle();
        inner.epoch += 1;
        drop(inner);

        info!("Session {} reset", self.session_id);
        self.events.emit_lossy(CropEvent::SessionReset {
            session_id: self.session_id,
            timestamp: Utc::now(),
        });
        true
    }

    /// Switch screens with nav-bar semantics
    ///
    /// `Analyze` always lands on Analyze. The other screens toggle: choosing
    /// the active one goes back to Analyze. `Dashboard` needs a signed-in
    /// user and is ignored otherwise.
    pub async fn navigate(&self, target: Screen, signed_in: bool) -> Screen {
        let mut inner = self.inner.write().await;
        let current = inner.view.active_screen;

        let next = match target {
            Screen::Analyze => Screen::Analyze,
            Screen::Dashboard if !signed_in => current,
            other if other == current => Screen::Analyze,
            other => other,
        };

        if next != current {
            inner.view.active_screen = next;
            drop(inner);
            self.events.emit_lossy(CropEvent::ScreenChanged {
                session_id: self.session_id,
                screen: next.as_str().to_string(),
                timestamp: Utc::now(),
            });
        }
        next
    }

    /// Force a screen without toggle semantics (close buttons, sign-out)
    pub async fn show(&self, screen: Screen) {
        let mut inner = self.inner.write().await;
        if inner.view.active_screen != screen {
            inner.view.active_screen = screen;
            drop(inner);
            self.events.emit_lossy(CropEvent::ScreenChanged {
                session_id: self.session_id,
                screen: screen.as_str().to_string(),
                timestamp: Utc::now(),
            });
        }
    }
}
