use super::state::{AppState, AuthStatus};
use crate::backend::{BackendApi, UserProfile};
use crate::storage::keys;
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;

/// Phone + OTP sign-in
///
/// `request_login` or `register` sends an OTP and moves auth to
/// `AwaitingOtp`; `verify_otp` stores the token and profile and moves it to
/// `LoggedIn`.
pub struct AuthFlow {
    state: Arc<AppState>,
    backend: Arc<dyn BackendApi>,
}

impl AuthFlow {
    pub fn new(state: Arc<AppState>, backend: Arc<dyn BackendApi>) -> Self {
        Self { state, backend }
    }

    pub async fn request_login(&self, phone_number: &str) -> Result<()> {
        let phone_number = normalize_phone(phone_number)?;
        self.backend
            .login(&phone_number)
            .await
            .context("Login request failed")?;
        self.await_otp(phone_number).await
    }

    pub async fn register(&self, name: &str, phone_number: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Name is required");
        }
        let phone_number = normalize_phone(phone_number)?;
        self.backend
            .register(name, &phone_number)
            .await
            .context("Registration failed")?;
        self.state.store().set(keys::NAME, name).await?;
        self.await_otp(phone_number).await
    }

    /// Verify the OTP for the number in `AwaitingOtp`
    pub async fn verify_otp(&self, otp: &str) -> Result<UserProfile> {
        let phone_number = match self.state.auth() {
            AuthStatus::AwaitingOtp { phone_number } => phone_number,
            other => bail!("No OTP pending (auth is {:?})", other),
        };
        self.verify_otp_for(&phone_number, otp).await
    }

    /// Verify an OTP for an explicit number, e.g. after an app restart
    pub async fn verify_otp_for(&self, phone_number: &str, otp: &str) -> Result<UserProfile> {
        let otp = otp.trim();
        if otp.is_empty() || !otp.chars().all(|c| c.is_ascii_digit()) {
            bail!("OTP must be digits");
        }

        let auth = self
            .backend
            .verify_otp(phone_number, otp)
            .await
            .context("OTP verification failed")?;

        let store = self.state.store();
        store.set(keys::TOKEN, &auth.token).await?;
        store.set(keys::NAME, &auth.user.name).await?;
        store.set(keys::PHONE_NUMBER, &auth.user.phone_number).await?;
        store.set(keys::IS_OTP_VERIFIED, "true").await?;
        store.set(keys::IS_LOGGED_IN, "true").await?;

        let profile = UserProfile {
            token: auth.token,
            ..auth.user
        };
        info!("Signed in");
        self.state.publish_auth(AuthStatus::LoggedIn(profile.clone()));
        Ok(profile)
    }

    async fn await_otp(&self, phone_number: String) -> Result<()> {
        self.state
            .store()
            .set(keys::IS_OTP_VERIFIED, "false")
            .await?;
        info!("OTP sent");
        self.state
            .publish_auth(AuthStatus::AwaitingOtp { phone_number });
        Ok(())
    }
}

/// Strip formatting; keep a leading `+` and require 10-15 digits
pub fn normalize_phone(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if !(10..=15).contains(&digits.len()) {
        bail!("Phone number must have 10 to 15 digits");
    }
    Ok(if plus { format!("+{}", digits) } else { digits })
}
