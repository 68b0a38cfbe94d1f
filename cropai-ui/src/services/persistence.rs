//! PostgREST persistence client
//!
//! Tables live under `{api_url}/rest/v1/{table}`. Every request carries the
//! public key in the `apikey` header. Reads of shared reference data use the
//! public key as bearer; treatment logs use the signed-in caller's token so
//! the store's row policies scope them to that user.

use super::{http, PersistenceService};
use async_trait::async_trait;
use cropai_common::config::BackendConfig;
use cropai_common::models::{
    AnalysisRecord, AuthSession, DiseaseInfo, NewAnalysisRecord, NewTreatmentLog, Solution,
    TreatmentLog,
};
use cropai_common::Result;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

pub const ANALYSIS_HISTORY_TABLE: &str = "analysis_history";
pub const DISEASE_INFO_TABLE: &str = "disease_info";
pub const SOLUTIONS_TABLE: &str = "solutions";
pub const TREATMENT_LOGS_TABLE: &str = "treatment_logs";

/// Strip characters that would break a PostgREST `or=(...)` filter
fn sanitize_search_term(query: &str) -> String {
    query
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '"' | '*' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Build the `or` filter used by text search
pub fn search_filter(query: &str) -> String {
    let term = sanitize_search_term(query);
    format!(
        "(name.ilike.*{0}*,crop_type.ilike.*{0}*,symptoms.ilike.*{0}*)",
        term
    )
}

/// REST client for the hosted tables
pub struct RestPersistenceClient {
    http_client: Client,
    rest_url: String,
    anon_key: String,
}

impl RestPersistenceClient {
    pub fn new(http_client: Client, backend: &BackendConfig) -> Self {
        Self {
            http_client,
            rest_url: backend.rest_url(),
            anon_key: backend.anon_key.clone(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    fn get(&self, table: &str, token: Option<&str>) -> RequestBuilder {
        self.http_client
            .get(self.table_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    fn insert(&self, table: &str, token: Option<&str>) -> RequestBuilder {
        self.http_client
            .post(self.table_url(table))
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }
}

#[async_trait]
impl PersistenceService for RestPersistenceClient {
    async fn insert_analysis(&self, record: &NewAnalysisRecord) -> Result<Option<AnalysisRecord>> {
        let response = self
            .insert(ANALYSIS_HISTORY_TABLE, None)
            .json(&[record])
            .send()
            .await?;
        let mut rows: Vec<AnalysisRecord> = http::decode_json(response).await?;
        debug!("Inserted analysis for {}", record.disease_detected);
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    async fn list_history(&self) -> Result<Vec<AnalysisRecord>> {
        let response = self
            .get(ANALYSIS_HISTORY_TABLE, None)
            .query(&[("select", "*"), ("order", "analyzed_at.desc")])
            .send()
            .await?;
        http::decode_json(response).await
    }

    async fn list_diseases(&self) -> Result<Vec<DiseaseInfo>> {
        let response = self
            .get(DISEASE_INFO_TABLE, None)
            .query(&[("select", "*"), ("order", "crop_type.asc")])
            .send()
            .await?;
        http::decode_json(response).await
    }

    async fn disease_by_name(&self, name: &str) -> Result<Option<DiseaseInfo>> {
        let name_filter = format!("eq.{}", name);
        let response = self
            .get(DISEASE_INFO_TABLE, None)
            .query(&[
                ("select", "*"),
                ("name", name_filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;
        let mut rows: Vec<DiseaseInfo> = http::decode_json(response).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    async fn search_diseases(&self, query: &str) -> Result<Vec<DiseaseInfo>> {
        let filter = search_filter(query);
        let response = self
            .get(DISEASE_INFO_TABLE, None)
            .query(&[
                ("select", "*"),
                ("or", filter.as_str()),
                ("order", "crop_type.asc"),
            ])
            .send()
            .await?;
        http::decode_json(response).await
    }

    async fn solutions_for(&self, disease_name: &str) -> Result<Vec<Solution>> {
        let name_filter = format!("eq.{}", disease_name);
        let response = self
            .get(SOLUTIONS_TABLE, None)
            .query(&[("select", "*"), ("disease_name", name_filter.as_str())])
            .send()
            .await?;
        http::decode_json(response).await
    }

    async fn insert_treatment(
        &self,
        caller: &AuthSession,
        log: &NewTreatmentLog,
    ) -> Result<Option<TreatmentLog>> {
        let response = self
            .insert(TREATMENT_LOGS_TABLE, Some(&caller.access_token))
            .json(&[log])
            .send()
            .await?;
        let mut rows: Vec<TreatmentLog> = http::decode_json(response).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    async fn list_treatments(
        &self,
        caller: &AuthSession,
        analysis_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TreatmentLog>> {
        let limit = limit.to_string();
        let mut params: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("order", "application_date.desc".to_string()),
            ("limit", limit),
        ];
        if let Some(id) = analysis_id {
            params.push(("analysis_id", format!("eq.{}", id)));
        }

        let response = self
            .get(TREATMENT_LOGS_TABLE, Some(&caller.access_token))
            .query(&params)
            .send()
            .await?;
        http::decode_json(response).await
    }
}
