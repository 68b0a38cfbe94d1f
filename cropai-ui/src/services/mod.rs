//! Remote collaborators: prediction, persistence and authentication
//!
//! Each collaborator is a trait so a real classifier or a different store
//! can be substituted without touching the orchestrator. The HTTP
//! implementations talk to a hosted backend (edge function, PostgREST
//! tables, GoTrue auth).

pub mod auth;
pub mod http;
pub mod persistence;
pub mod prediction;

use async_trait::async_trait;
use axum::body::Bytes;
use cropai_common::models::{
    AnalysisRecord, AuthSession, DiseaseInfo, NewAnalysisRecord, NewTreatmentLog, Prediction,
    Solution, TreatmentLog,
};
use cropai_common::Result;

pub use auth::GoTrueAuthClient;
pub use persistence::RestPersistenceClient;
pub use prediction::HttpPredictionClient;

/// Image submitted by the user
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Image classifier contract: image in, ranked labels out
///
/// Implementations return predictions sorted by descending confidence.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, image: &ImageUpload) -> Result<Vec<Prediction>>;
}

/// Structured data store
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Insert one analysis; returns the stored row when the store echoes it
    async fn insert_analysis(&self, record: &NewAnalysisRecord) -> Result<Option<AnalysisRecord>>;

    /// Full history, most recent first
    async fn list_history(&self) -> Result<Vec<AnalysisRecord>>;

    /// Every reference entry, ordered by crop type
    async fn list_diseases(&self) -> Result<Vec<DiseaseInfo>>;

    /// Reference entry with exactly this name
    async fn disease_by_name(&self, name: &str) -> Result<Option<DiseaseInfo>>;

    /// Server-side text search over name, crop type and symptoms
    async fn search_diseases(&self, query: &str) -> Result<Vec<DiseaseInfo>>;

    /// Categorized guidance for a disease (unsorted)
    async fn solutions_for(&self, disease_name: &str) -> Result<Vec<Solution>>;

    /// Insert a treatment log on behalf of the signed-in caller
    async fn insert_treatment(
        &self,
        caller: &AuthSession,
        log: &NewTreatmentLog,
    ) -> Result<Option<TreatmentLog>>;

    /// Caller's treatment logs, latest application first, at most `limit`
    async fn list_treatments(
        &self,
        caller: &AuthSession,
        analysis_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TreatmentLog>>;
}

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// Provider issued a session immediately
    SignedIn(AuthSession),
    /// Provider wants the email address confirmed first
    ConfirmationRequired,
}

/// Hosted authentication provider
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<SignUpOutcome>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn sign_out(&self, session: &AuthSession) -> Result<()>;
}
