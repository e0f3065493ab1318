//! User preference cache
//!
//! Provides the cultural preference and accent needed to personalise a
//! voice session without a network round-trip on every screen visit.

mod cache;
mod preferences;

pub use cache::SettingsCache;
pub use preferences::{Preferences, SettingsSnapshot};
