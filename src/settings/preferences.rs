use serde::{Deserialize, Serialize};

/// Preference fields that personalise a voice session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Free-form, e.g. "indian", "american"; empty until loaded
    pub cultural_preference: String,
    /// Selects the agent's voice identity
    pub accent: String,
}

/// Result of `SettingsCache::fetch_user_settings`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsSnapshot {
    /// Set once a load attempt finished, successful or not
    pub loaded: bool,
    pub preferences: Preferences,
}
