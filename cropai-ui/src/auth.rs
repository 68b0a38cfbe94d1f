//! Account sign-up, sign-in and sign-out
//!
//! Forms are validated locally before the provider is called. Provider
//! failures come back as `Error::Service` carrying the provider's own text,
//! which is what the user sees.

use crate::services::{AuthService, SignUpOutcome};
use crate::session::Session;
use cropai_common::{Error, Result};
use serde::Deserialize;
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

pub const FULL_NAME_REQUIRED: &str = "Please enter your full name";
pub const EMAIL_REQUIRED: &str = "Please enter your email";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

/// Message shown after a sign-up that needs email confirmation
pub const CONFIRM_EMAIL_MESSAGE: &str =
    "Account created. Check your email to confirm your address, then sign in.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::InvalidInput(EMAIL_REQUIRED.to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(PASSWORD_TOO_SHORT.to_string()));
    }
    Ok(())
}

impl SignInForm {
    pub fn validate(&self) -> Result<()> {
        validate_credentials(&self.email, &self.password)
    }
}

impl SignUpForm {
    /// Full name first, then email and password
    pub fn validate(&self) -> Result<()> {
        if self.full_name.trim().is_empty() {
            return Err(Error::InvalidInput(FULL_NAME_REQUIRED.to_string()));
        }
        validate_credentials(&self.email, &self.password)
    }
}

/// What the account form should show next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    SignedIn,
    ConfirmationRequired,
}

pub async fn sign_in(session: &Session, auth: &dyn AuthService, form: &SignInForm) -> Result<()> {
    form.validate()?;
    let auth_session = auth.sign_in(form.email.trim(), &form.password).await?;
    session.sign_in(auth_session).await;
    Ok(())
}

pub async fn sign_up(
    session: &Session,
    auth: &dyn AuthService,
    form: &SignUpForm,
) -> Result<AuthOutcome> {
    form.validate()?;
    let outcome = auth
        .sign_up(form.email.trim(), &form.password, form.full_name.trim())
        .await?;

    match outcome {
        SignUpOutcome::SignedIn(auth_session) => {
            session.sign_in(auth_session).await;
            Ok(AuthOutcome::SignedIn)
        }
        SignUpOutcome::ConfirmationRequired => {
            info!("Sign-up for {} awaiting email confirmation", form.email.trim());
            Ok(AuthOutcome::ConfirmationRequired)
        }
    }
}

/// Sign out locally; a provider failure is logged only
pub async fn sign_out(session: &Session, auth: &dyn AuthService) {
    if let Some(previous) = session.sign_out().await {
        if let Err(e) = auth.sign_out(&previous).await {
            warn!("Provider sign-out failed for user {}: {}", previous.user.id, e);
        }
    }
}
