//! Backend REST API
//!
//! Phone/OTP auth, user settings, conversation history, chat messages and the
//! opening message that seeds a voice session. `BackendApi` is the seam the
//! rest of the crate depends on; `BackendClient` is the HTTP implementation.

pub mod client;
pub mod messages;

use crate::error::ApiError;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use client::BackendClient;
pub use messages::{
    Ack, AuthResponse, ChatMessage, HistoryPage, OpeningMessage, RemoteSettings, Sender,
    SettingsUpdate, UserProfile,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Request an OTP for an existing account
    async fn login(&self, phone_number: &str) -> Result<Ack, ApiError>;

    /// Create an account; the backend sends an OTP as part of registration
    async fn register(&self, name: &str, phone_number: &str) -> Result<Ack, ApiError>;

    async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<AuthResponse, ApiError>;

    async fn get_settings(&self, token: &str) -> Result<RemoteSettings, ApiError>;

    async fn update_settings(
        &self,
        token: &str,
        update: SettingsUpdate,
    ) -> Result<RemoteSettings, ApiError>;

    /// One page of history. `cursor` is the `next` value of the previous page.
    async fn conversation_history(
        &self,
        token: &str,
        cursor: Option<String>,
    ) -> Result<HistoryPage, ApiError>;

    async fn post_chat_message(&self, token: &str, message: &str) -> Result<ChatMessage, ApiError>;

    async fn opening_message(&self, token: &str) -> Result<OpeningMessage, ApiError>;
}
