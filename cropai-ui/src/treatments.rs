//! Treatment tracker
//!
//! Signed-in users log treatments they applied, optionally linked to one of
//! their analyses. Logs are read back latest application first.

use crate::services::PersistenceService;
use chrono::{NaiveDate, Utc};
use cropai_common::models::{AuthSession, NewTreatmentLog, TreatmentLog, TreatmentType};
use cropai_common::{Error, Result};
use serde::Deserialize;
use tracing::{info, warn};

/// Logs shown per list
pub const TREATMENT_PAGE_SIZE: usize = 10;
/// Highest effectiveness rating
pub const MAX_RATING: u8 = 5;

/// Split a comma-separated product list, trimming and dropping empties
pub fn parse_products(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Treatment form as posted by the dashboard
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreatmentForm {
    #[serde(default)]
    pub analysis_id: Option<String>,
    pub treatment_type: String,
    #[serde(default)]
    pub products_used: String,
    #[serde(default)]
    pub application_date: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub field_size_treated: String,
    #[serde(default)]
    pub effectiveness_rating: String,
    #[serde(default)]
    pub notes: String,
}

fn parse_amount(raw: &str, field: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(Error::InvalidInput(format!("Invalid {}: {}", field, raw))),
    }
}

fn parse_rating(raw: &str) -> Result<Option<u8>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<u8>() {
        Ok(0) => Ok(None),
        Ok(rating) if rating <= MAX_RATING => Ok(Some(rating)),
        _ => Err(Error::InvalidInput(format!(
            "Effectiveness rating must be between 0 and {}",
            MAX_RATING
        ))),
    }
}

impl TreatmentForm {
    /// Validate and build the insert payload for `user_id`
    ///
    /// A blank application date means `today`; a rating of 0 means not rated.
    pub fn into_new_log(self, user_id: &str, today: NaiveDate) -> Result<NewTreatmentLog> {
        let treatment_type: TreatmentType = self.treatment_type.parse()?;

        let application_date = match self.application_date.trim() {
            "" => today,
            raw => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| Error::InvalidInput(format!("Invalid application date: {}", raw)))?,
        };

        let analysis_id = self
            .analysis_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(NewTreatmentLog {
            user_id: user_id.to_string(),
            analysis_id,
            treatment_type,
            products_used: parse_products(&self.products_used),
            application_date,
            cost: parse_amount(&self.cost, "cost")?,
            field_size_treated: parse_amount(&self.field_size_treated, "field size")?,
            effectiveness_rating: parse_rating(&self.effectiveness_rating)?,
            notes: self.notes.trim().to_string(),
        })
    }
}

/// Validate the form and insert it on behalf of the caller
pub async fn record_treatment(
    store: &dyn PersistenceService,
    caller: &AuthSession,
    form: TreatmentForm,
) -> Result<Option<TreatmentLog>> {
    let log = form.into_new_log(&caller.user.id, Utc::now().date_naive())?;
    let stored = store.insert_treatment(caller, &log).await?;
    info!(
        "Recorded {} treatment for user {} ({} products)",
        log.treatment_type,
        caller.user.id,
        log.products_used.len()
    );
    Ok(stored)
}

/// Caller's latest treatments; failures are logged and yield an empty list
pub async fn recent_treatments(
    store: &dyn PersistenceService,
    caller: &AuthSession,
    analysis_id: Option<&str>,
) -> Vec<TreatmentLog> {
    match store
        .list_treatments(caller, analysis_id, TREATMENT_PAGE_SIZE)
        .await
    {
        Ok(logs) => logs,
        Err(e) => {
            warn!("Failed to load treatments for user {}: {}", caller.user.id, e);
            Vec::new()
        }
    }
}
