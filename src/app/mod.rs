//! App-wide state and the sign-in flow
//!
//! Auth, language and text size live in one explicit `AppState` created at
//! startup and shared by reference, instead of being looked up ambiently.

mod auth;
mod state;

pub use auth::{normalize_phone, AuthFlow};
pub use state::{AppState, AuthStatus, TextSize, DEFAULT_LANGUAGE};
