//! GoTrue authentication client
//!
//! - `POST {auth}/signup` with `{email, password, data: {full_name}}`
//! - `POST {auth}/token?grant_type=password` with `{email, password}`
//! - `POST {auth}/logout` with the user's bearer token
//!
//! Sign-up answers with a full session when the project auto-confirms
//! emails, otherwise with the bare user object.

use super::{http, AuthService, SignUpOutcome};
use async_trait::async_trait;
use cropai_common::config::BackendConfig;
use cropai_common::models::{AuthSession, AuthUser};
use cropai_common::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        let full_name = user
            .user_metadata
            .get("full_name")
            .and_then(Value::as_str)
            .map(str::to_string);
        AuthUser {
            id: user.id,
            email: user.email,
            full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    user: GoTrueUser,
}

impl From<GoTrueSession> for AuthSession {
    fn from(session: GoTrueSession) -> Self {
        AuthSession {
            access_token: session.access_token,
            user: session.user.into(),
        }
    }
}

/// Interpret a sign-up response body
fn parse_sign_up(body: Value) -> Result<SignUpOutcome> {
    if body.get("access_token").is_some() {
        let session: GoTrueSession = serde_json::from_value(body)?;
        return Ok(SignUpOutcome::SignedIn(session.into()));
    }
    if body.get("id").is_some() || body.get("user").is_some() {
        return Ok(SignUpOutcome::ConfirmationRequired);
    }
    Err(Error::Internal(
        "Sign-up response contained neither a session nor a user".to_string(),
    ))
}

/// HTTP client for the hosted auth provider
pub struct GoTrueAuthClient {
    http_client: Client,
    auth_url: String,
    anon_key: String,
}

impl GoTrueAuthClient {
    pub fn new(http_client: Client, backend: &BackendConfig) -> Self {
        Self {
            http_client,
            auth_url: backend.auth_url(),
            anon_key: backend.anon_key.clone(),
        }
    }
}

#[async_trait]
impl AuthService for GoTrueAuthClient {
    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<SignUpOutcome> {
        let response = self
            .http_client
            .post(format!("{}/signup", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;

        let body: Value = http::decode_json(response).await?;
        let outcome = parse_sign_up(body)?;
        info!("Sign-up accepted for {}", email);
        Ok(outcome)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .http_client
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let session: GoTrueSession = http::decode_json(response).await?;
        debug!("Signed in user {}", session.user.id);
        Ok(session.into())
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<()> {
        let response = self
            .http_client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        http::ensure_success(response).await?;
        Ok(())
    }
}
