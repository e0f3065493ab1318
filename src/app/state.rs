use crate::backend::UserProfile;
use crate::storage::{keys, SecureStore};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Where the user is in the sign-in lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    LoggedOut,
    /// OTP requested for this phone number, not yet verified
    AwaitingOtp { phone_number: String },
    LoggedIn(UserProfile),
}

impl AuthStatus {
    /// No usable token: callers send the user to the login flow
    pub fn requires_login(&self) -> bool {
        !matches!(self, Self::LoggedIn(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TextSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl FromStr for TextSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => anyhow::bail!("Unknown text size: {}", other),
        }
    }
}

/// Process-wide app state: auth, language, text size and onboarding
///
/// Initialised once at startup from storage. Each field has a typed getter,
/// a `watch` subscription and an update method that persists before
/// publishing. `logout` tears the account part down.
pub struct AppState {
    store: Arc<dyn SecureStore>,
    auth: watch::Sender<AuthStatus>,
    language: watch::Sender<String>,
    text_size: watch::Sender<TextSize>,
    onboarding_complete: watch::Sender<bool>,
}

impl AppState {
    pub async fn initialize(store: Arc<dyn SecureStore>) -> Result<Self> {
        let auth = load_auth(store.as_ref()).await?;
        let language = store
            .get_non_empty(keys::LANGUAGE)
            .await?
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let text_size = match store.get_non_empty(keys::TEXT_SIZE).await? {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, using default", e);
                TextSize::default()
            }),
            None => TextSize::default(),
        };
        let onboarding_complete =
            store.get(keys::ONBOARDING_COMPLETE).await?.as_deref() == Some("true");

        info!(
            "App state initialised (logged_in={}, language={}, text_size={})",
            !auth.requires_login(),
            language,
            text_size.as_str()
        );

        Ok(Self {
            store,
            auth: watch::Sender::new(auth),
            language: watch::Sender::new(language),
            text_size: watch::Sender::new(text_size),
            onboarding_complete: watch::Sender::new(onboarding_complete),
        })
    }

    pub fn store(&self) -> Arc<dyn SecureStore> {
        Arc::clone(&self.store)
    }

    pub fn auth(&self) -> AuthStatus {
        self.auth.borrow().clone()
    }

    pub fn language(&self) -> String {
        self.language.borrow().clone()
    }

    pub fn text_size(&self) -> TextSize {
        *self.text_size.borrow()
    }

    /// Whether the intro screens were finished on this device
    pub fn onboarding_complete(&self) -> bool {
        *self.onboarding_complete.borrow()
    }

    pub fn subscribe_auth(&self) -> watch::Receiver<AuthStatus> {
        self.auth.subscribe()
    }

    pub fn subscribe_language(&self) -> watch::Receiver<String> {
        self.language.subscribe()
    }

    pub fn subscribe_text_size(&self) -> watch::Receiver<TextSize> {
        self.text_size.subscribe()
    }

    pub fn subscribe_onboarding(&self) -> watch::Receiver<bool> {
        self.onboarding_complete.subscribe()
    }

    /// Profile for a session start, re-read from storage
    pub async fn profile(&self) -> Result<UserProfile> {
        Ok(UserProfile {
            name: self.store.get(keys::NAME).await?.unwrap_or_default(),
            phone_number: self.store.get(keys::PHONE_NUMBER).await?.unwrap_or_default(),
            token: self.store.get(keys::TOKEN).await?.unwrap_or_default(),
        })
    }

    pub async fn set_language(&self, language: &str) -> Result<()> {
        self.store.set(keys::LANGUAGE, language).await?;
        self.language.send_replace(language.to_string());
        Ok(())
    }

    pub async fn set_text_size(&self, size: TextSize) -> Result<()> {
        self.store.set(keys::TEXT_SIZE, size.as_str()).await?;
        self.text_size.send_replace(size);
        Ok(())
    }

    pub async fn complete_onboarding(&self) -> Result<()> {
        self.store.set(keys::ONBOARDING_COMPLETE, "true").await?;
        self.onboarding_complete.send_replace(true);
        Ok(())
    }

    pub(crate) fn publish_auth(&self, status: AuthStatus) {
        self.auth.send_replace(status);
    }

    /// Sign out: remove every account-scoped key, keep device preferences
    pub async fn logout(&self) -> Result<()> {
        info!("Logging out");
        self.store.remove_many(keys::ACCOUNT_KEYS).await?;
        self.publish_auth(AuthStatus::LoggedOut);
        Ok(())
    }
}

async fn load_auth(store: &dyn SecureStore) -> Result<AuthStatus> {
    let logged_in = store.get(keys::IS_LOGGED_IN).await?.as_deref() == Some("true");
    let token = store.get_non_empty(keys::TOKEN).await?;

    match (logged_in, token) {
        (true, Some(token)) => Ok(AuthStatus::LoggedIn(UserProfile {
            name: store.get(keys::NAME).await?.unwrap_or_default(),
            phone_number: store.get(keys::PHONE_NUMBER).await?.unwrap_or_default(),
            token,
        })),
        _ => Ok(AuthStatus::LoggedOut),
    }
}
