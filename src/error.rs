//! Typed failures surfaced to callers.
//!
//! Internal plumbing uses `anyhow`; these enums exist where a caller has to
//! branch on what went wrong (show an alert, send the user to login, retry).

use crate::session::SessionStatus;
use thiserror::Error;

/// Failures from the backend REST API
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the stored token is missing or expired; callers route to login
    #[error("Not authorized")]
    Unauthorized,

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

/// Failures when starting or driving a voice session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Your profile is missing a name or phone number")]
    MissingProfile,

    #[error("A session cannot start while status is {0}")]
    NotIdle(SessionStatus),

    #[error("Could not get a connection URL: {0}")]
    SignedUrl(String),

    #[error("Could not connect to the voice agent: {0}")]
    Connect(String),

    #[error("The microphone cannot be toggled while status is {0}")]
    MicToggleUnavailable(SessionStatus),

    /// The attempt was overtaken by a stop, disconnect or teardown
    #[error("Session start was cancelled")]
    Cancelled,

    #[error("The voice screen has been closed")]
    Closed,

    #[error("Unknown client tool: {0}")]
    ToolNotFound(String),
}
