//! Domain models shared between the service clients and the UI
//!
//! Field names follow the wire format of the persistence tables
//! (`analysis_history`, `disease_info`, `solutions`, `treatment_logs`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One (disease label, confidence) pair returned by the prediction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub disease: String,
    /// Confidence in percent (0-100)
    pub confidence: f64,
}

/// Success body of the prediction call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predictions: Vec<Prediction>,
}

/// Persisted analysis, as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub disease_detected: String,
    pub confidence: f64,
    pub analyzed_at: DateTime<Utc>,
}

/// Insert payload for `analysis_history`; `id` and `analyzed_at` are server-assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalysisRecord {
    pub disease_detected: String,
    pub confidence: f64,
}

impl From<&Prediction> for NewAnalysisRecord {
    fn from(prediction: &Prediction) -> Self {
        Self {
            disease_detected: prediction.disease.clone(),
            confidence: prediction.confidence,
        }
    }
}

/// Reference entry from `disease_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    pub id: String,
    pub name: String,
    pub crop_type: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub causes: String,
    #[serde(default)]
    pub prevention: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub affected_parts: Vec<String>,
    #[serde(default)]
    pub optimal_conditions: String,
}

/// Solution priority
///
/// Unknown strings from the store deserialize to `Other` and sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[serde(other)]
    Other,
}

impl Priority {
    /// Sort rank (high first)
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::Other => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Other => "other",
        }
    }
}

/// Categorized guidance entry from `solutions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub disease_name: String,
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<String>,
    pub priority: Priority,
}

/// Kind of treatment applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentType {
    Chemical,
    Organic,
    Cultural,
    Biological,
}

impl TreatmentType {
    pub const ALL: [TreatmentType; 4] = [
        TreatmentType::Chemical,
        TreatmentType::Organic,
        TreatmentType::Cultural,
        TreatmentType::Biological,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TreatmentType::Chemical => "chemical",
            TreatmentType::Organic => "organic",
            TreatmentType::Cultural => "cultural",
            TreatmentType::Biological => "biological",
        }
    }
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreatmentType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chemical" => Ok(TreatmentType::Chemical),
            "organic" => Ok(TreatmentType::Organic),
            "cultural" => Ok(TreatmentType::Cultural),
            "biological" => Ok(TreatmentType::Biological),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown treatment type: {}",
                other
            ))),
        }
    }
}

/// Row from `treatment_logs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentLog {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub analysis_id: Option<String>,
    pub treatment_type: TreatmentType,
    #[serde(default)]
    pub products_used: Vec<String>,
    pub application_date: NaiveDate,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub field_size_treated: f64,
    #[serde(default)]
    pub effectiveness_rating: Option<u8>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `treatment_logs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTreatmentLog {
    pub user_id: String,
    pub analysis_id: Option<String>,
    pub treatment_type: TreatmentType,
    pub products_used: Vec<String>,
    pub application_date: NaiveDate,
    pub cost: f64,
    pub field_size_treated: f64,
    pub effectiveness_rating: Option<u8>,
    pub notes: String,
}

/// Authenticated user as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl AuthUser {
    /// Name shown in the nav bar
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Account")
    }
}

/// Signed-in session: bearer token plus user identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}
