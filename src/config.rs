use anyhow::Result;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub vendor: VendorConfig,
    pub session: SessionSettings,
    pub settings: SettingsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bot.example.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// REST base used for signed-URL requests
    pub api_url: String,
    pub api_key: SecretString,
    pub agent_id: String,
    /// Voice id per accent; `default` is used for any accent without an entry
    pub voices: HashMap<String, String>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.elevenlabs.io".to_string(),
            api_key: SecretString::from(String::new()),
            agent_id: String::new(),
            voices: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Persona name injected as `bot_name`
    pub bot_name: String,
    /// Quiet period after the last AI message before speaking decays to listening
    pub speaking_decay_ms: u64,
    /// Used whenever the cached cultural preference is empty
    pub default_cultural_preference: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            bot_name: "Saathi".to_string(),
            speaking_decay_ms: 3_000,
            default_cultural_preference: "indian".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Window during which a local settings change suppresses the remote fetch
    pub recent_update_window_ms: i64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            recent_update_window_ms: 300_000, // 5 minutes
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("voice-companion").join("store.json"),
        }
    }
}

impl Config {
    /// Load `path` (any format the `config` crate understands, extension optional)
    /// and overlay `COMPANION__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("COMPANION").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.session.speaking_decay_ms, 3_000);
        assert_eq!(cfg.settings.recent_update_window_ms, 300_000);
        assert_eq!(cfg.session.default_cultural_preference, "indian");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = Config::load("does/not/exist/companion").unwrap();
        assert_eq!(cfg.backend.timeout_secs, 30);
    }

    #[test]
    fn test_load_vendor_section_from_file() {
        use secrecy::ExposeSecret;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companion.toml");
        std::fs::write(
            &path,
            "[vendor]\napi_key = \"sk-test\"\nagent_id = \"agent-1\"\n\n[vendor.voices]\nindian = \"voice-in\"\n",
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.vendor.api_key.expose_secret(), "sk-test");
        assert_eq!(cfg.vendor.agent_id, "agent-1");
        assert_eq!(cfg.vendor.voices["indian"], "voice-in");
        assert!(!format!("{:?}", cfg.vendor).contains("sk-test"));
    }
}
