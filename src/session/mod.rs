//! Voice session management
//!
//! This module provides the `SessionController` that manages:
//! - The session status state machine (idle, connecting, listening, speaking, mic-off)
//! - Session start: profile checks, opening message, signed URL, dynamic variables
//! - Vendor lifecycle events and the speaking-decay timer
//! - Publishing status for the UI (`mirror`)

mod config;
mod controller;
pub mod mirror;
mod status;
mod variables;

pub use config::SessionConfig;
pub use controller::{SessionController, SessionRequest};
pub use mirror::{ActionBar, PrimaryAction, VoiceBubble};
pub use status::{SessionSnapshot, SessionStatus};
pub use variables::{system_prompt, DynamicVariables};
