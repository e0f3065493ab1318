use crate::config::Config;
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for the session controller
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Persona name the agent introduces itself with
    pub bot_name: String,

    /// How long `speaking` survives without a further AI message
    /// Default: 3 seconds
    pub speaking_decay: Duration,

    /// Substituted when the cached cultural preference is empty
    pub default_cultural_preference: String,

    /// Voice id per accent; the `default` entry covers unlisted accents
    pub voices: HashMap<String, String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bot_name: "Saathi".to_string(),
            speaking_decay: Duration::from_millis(3_000),
            default_cultural_preference: "indian".to_string(),
            voices: HashMap::new(),
        }
    }
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bot_name: config.session.bot_name.clone(),
            speaking_decay: Duration::from_millis(config.session.speaking_decay_ms),
            default_cultural_preference: config.session.default_cultural_preference.clone(),
            voices: config.vendor.voices.clone(),
        }
    }

    /// Voice identity for an accent
    pub fn voice_for(&self, accent: &str) -> Option<String> {
        self.voices
            .get(accent)
            .or_else(|| self.voices.get("default"))
            .cloned()
    }

    pub fn cultural_preference_or_default<'a>(&'a self, preference: &'a str) -> &'a str {
        if preference.trim().is_empty() {
            &self.default_cultural_preference
        } else {
            preference
        }
    }
}
