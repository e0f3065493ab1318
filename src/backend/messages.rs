use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account fields the app keeps locally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub phone_number: String,
    /// Bearer token; not part of the backend user object
    #[serde(default, skip_serializing)]
    pub token: String,
}

impl UserProfile {
    /// Both identity fields present
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.phone_number.trim().is_empty()
    }
}

/// Body for login (OTP request)
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub phone_number: String,
}

/// Body for account registration
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub phone_number: String,
}

/// Body for OTP verification
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone_number: String,
    pub otp: String,
}

/// Returned by OTP verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Generic acknowledgement (`{"message": "..."}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

/// User settings as stored by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub cultural_preference: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
}

/// PATCH body; absent fields are left untouched server-side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultural_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One message of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<i64>,
    pub sender: Sender,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body for posting a chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessageRequest {
    pub message: String,
}

/// One page of history; `next` is the absolute URL of the following page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub results: Vec<ChatMessage>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Greeting and running summary used to seed a voice session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningMessage {
    #[serde(default)]
    pub opening_message: String,
    #[serde(default)]
    pub summary: String,
}
