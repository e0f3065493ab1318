use super::preferences::{Preferences, SettingsSnapshot};
use crate::backend::{BackendApi, RemoteSettings, SettingsUpdate};
use crate::error::ApiError;
use crate::storage::{keys, SecureStore};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Read-through cache of the preference fields a session needs
///
/// Backed by the secure store and refreshed from the backend settings
/// endpoint. A local change marks the cache as fresh for a short window so
/// the next screen visit does not immediately refetch.
pub struct SettingsCache {
    store: Arc<dyn SecureStore>,
    backend: Arc<dyn BackendApi>,
    recent_update_window_ms: i64,
    current: Mutex<SettingsSnapshot>,
}

impl SettingsCache {
    pub fn new(
        store: Arc<dyn SecureStore>,
        backend: Arc<dyn BackendApi>,
        recent_update_window_ms: i64,
    ) -> Self {
        Self {
            store,
            backend,
            recent_update_window_ms,
            current: Mutex::new(SettingsSnapshot::default()),
        }
    }

    /// Last value handed out, without touching storage or network
    pub async fn current(&self) -> SettingsSnapshot {
        self.current.lock().await.clone()
    }

    /// Load preferences when the voice screen mounts
    ///
    /// Never fails: every path ends with `loaded == true` so callers are not
    /// blocked. Storage errors are logged and treated as missing values.
    pub async fn fetch_user_settings(&self) -> SettingsSnapshot {
        let token = self.read(keys::TOKEN).await;
        let Some(token) = token else {
            info!("No token, settings loaded without preferences");
            return self.mark_loaded().await;
        };

        if self.recently_updated().await {
            let cached = self.read(keys::CULTURAL_PREFERENCE).await.unwrap_or_default();
            info!("Settings updated locally, using cached preference");
            self.clear_update_flag().await;

            let mut current = self.current.lock().await;
            current.preferences.cultural_preference = cached;
            current.loaded = true;
            return current.clone();
        }

        match self.backend.get_settings(&token).await {
            Ok(remote) => {
                debug!("Fetched remote settings: {:?}", remote);
                if let Err(e) = self.write_remote(&remote).await {
                    warn!("Failed to cache settings: {:#}", e);
                }
            }
            Err(e) => warn!("Settings fetch failed, keeping cached value: {}", e),
        }

        // Whatever the outcome, the store now holds the best known value
        let cached = self.read(keys::CULTURAL_PREFERENCE).await.unwrap_or_default();
        let mut current = self.current.lock().await;
        current.preferences.cultural_preference = cached;
        current.loaded = true;
        current.clone()
    }

    /// Re-read cultural preference and accent when the screen regains focus
    pub async fn refresh_on_focus(&self) -> Preferences {
        let cultural_preference = self.read(keys::CULTURAL_PREFERENCE).await.unwrap_or_default();
        let accent = self.read(keys::ACCENT).await.unwrap_or_default();

        let mut current = self.current.lock().await;
        current.preferences = Preferences {
            cultural_preference,
            accent,
        };
        current.preferences.clone()
    }

    /// Push a change to the backend, then cache it locally as fresh
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<RemoteSettings> {
        let token = self
            .read(keys::TOKEN)
            .await
            .ok_or(ApiError::Unauthorized)?;

        let remote = self.backend.update_settings(&token, update).await?;
        self.write_remote(&remote).await?;
        self.mark_updated_now().await?;

        let preferences = self.refresh_on_focus().await;
        info!("Settings updated: {:?}", preferences);
        Ok(remote)
    }

    /// Record a change that was already saved remotely elsewhere
    pub async fn record_local_update(&self, preferences: &Preferences) -> Result<()> {
        self.store
            .set(keys::CULTURAL_PREFERENCE, &preferences.cultural_preference)
            .await?;
        self.store.set(keys::ACCENT, &preferences.accent).await?;
        self.mark_updated_now().await?;

        self.current.lock().await.preferences = preferences.clone();
        Ok(())
    }

    async fn mark_loaded(&self) -> SettingsSnapshot {
        let mut current = self.current.lock().await;
        current.loaded = true;
        current.clone()
    }

    async fn mark_updated_now(&self) -> Result<()> {
        self.store.set(keys::SETTINGS_JUST_UPDATED, "true").await?;
        self.store
            .set(
                keys::SETTINGS_UPDATE_TIMESTAMP,
                &Utc::now().timestamp_millis().to_string(),
            )
            .await
            .context("Failed to record settings update time")
    }

    /// Flag set and timestamp inside the window. A stale or malformed
    /// flag is discarded.
    async fn recently_updated(&self) -> bool {
        let flag = self.read(keys::SETTINGS_JUST_UPDATED).await;
        if flag.as_deref() != Some("true") {
            return false;
        }

        let timestamp = self
            .read(keys::SETTINGS_UPDATE_TIMESTAMP)
            .await
            .and_then(|ts| ts.parse::<i64>().ok());

        let fresh = match timestamp {
            Some(ts) => {
                let age = Utc::now().timestamp_millis() - ts;
                age >= 0 && age < self.recent_update_window_ms
            }
            None => false,
        };

        if !fresh {
            debug!("Discarding stale settings update flag");
            self.clear_update_flag().await;
        }
        fresh
    }

    async fn clear_update_flag(&self) {
        if let Err(e) = self
            .store
            .remove_many(&[keys::SETTINGS_JUST_UPDATED, keys::SETTINGS_UPDATE_TIMESTAMP])
            .await
        {
            warn!("Failed to clear settings update flag: {:#}", e);
        }
    }

    async fn write_remote(&self, remote: &RemoteSettings) -> Result<()> {
        if let Some(preference) = &remote.cultural_preference {
            self.store.set(keys::CULTURAL_PREFERENCE, preference).await?;
        }
        if let Some(accent) = &remote.accent {
            self.store.set(keys::ACCENT, accent).await?;
        }
        if let Some(language) = &remote.language {
            self.store.set(keys::LANGUAGE, language).await?;
        }
        Ok(())
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get_non_empty(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read {} from store: {:#}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackendApi;
    use crate::storage::MemoryStore;

    const WINDOW_MS: i64 = 300_000;

    fn ago(ms: i64) -> String {
        (Utc::now().timestamp_millis() - ms).to_string()
    }

    #[tokio::test]
    async fn test_recent_local_update_skips_network() {
        let ts = ago(120_000);
        let store = Arc::new(MemoryStore::with_entries([
            (keys::TOKEN, "tok"),
            (keys::CULTURAL_PREFERENCE, "american"),
            (keys::SETTINGS_JUST_UPDATED, "true"),
            (keys::SETTINGS_UPDATE_TIMESTAMP, ts.as_str()),
        ]));
        let mut backend = MockBackendApi::new();
        backend.expect_get_settings().times(0);

        let cache = SettingsCache::new(store.clone(), Arc::new(backend), WINDOW_MS);
        let snapshot = cache.fetch_user_settings().await;

        assert!(snapshot.loaded);
        assert_eq!(snapshot.preferences.cultural_preference, "american");
        assert_eq!(store.get(keys::SETTINGS_JUST_UPDATED).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stale_flag_fetches_and_clears() {
        let ts = ago(WINDOW_MS + 60_000);
        let store = Arc::new(MemoryStore::with_entries([
            (keys::TOKEN, "tok"),
            (keys::CULTURAL_PREFERENCE, "american"),
            (keys::SETTINGS_JUST_UPDATED, "true"),
            (keys::SETTINGS_UPDATE_TIMESTAMP, ts.as_str()),
        ]));
        let mut backend = MockBackendApi::new();
        backend
            .expect_get_settings()
            .withf(|token| token == "tok")
            .times(1)
            .returning(|_| {
                Ok(RemoteSettings {
                    language: Some("hi".into()),
                    cultural_preference: Some("bengali".into()),
                    accent: Some("indian".into()),
                })
            });

        let cache = SettingsCache::new(store.clone(), Arc::new(backend), WINDOW_MS);
        let snapshot = cache.fetch_user_settings().await;

        assert_eq!(snapshot.preferences.cultural_preference, "bengali");
        assert_eq!(store.get(keys::SETTINGS_JUST_UPDATED).await.unwrap(), None);
        assert_eq!(store.get(keys::SETTINGS_UPDATE_TIMESTAMP).await.unwrap(), None);
        assert_eq!(store.get(keys::LANGUAGE).await.unwrap().as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_no_token_resolves_loaded_without_request() {
        let store = Arc::new(MemoryStore::new());
        let mut backend = MockBackendApi::new();
        backend.expect_get_settings().times(0);

        let cache = SettingsCache::new(store, Arc::new(backend), WINDOW_MS);
        let snapshot = cache.fetch_user_settings().await;

        assert!(snapshot.loaded);
        assert_eq!(snapshot.preferences.cultural_preference, "");
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_cached_value() {
        let store = Arc::new(MemoryStore::with_entries([
            (keys::TOKEN, "tok"),
            (keys::CULTURAL_PREFERENCE, "tamil"),
        ]));
        let mut backend = MockBackendApi::new();
        backend
            .expect_get_settings()
            .times(1)
            .returning(|_| Err(ApiError::Status { status: 502, body: "bad gateway".into() }));

        let cache = SettingsCache::new(store, Arc::new(backend), WINDOW_MS);
        let snapshot = cache.fetch_user_settings().await;

        assert!(snapshot.loaded);
        assert_eq!(snapshot.preferences.cultural_preference, "tamil");
    }

    #[tokio::test]
    async fn test_update_settings_marks_fresh() {
        let store = Arc::new(MemoryStore::with_entries([(keys::TOKEN, "tok")]));
        let mut backend = MockBackendApi::new();
        backend
            .expect_update_settings()
            .times(1)
            .returning(|_, update| {
                Ok(RemoteSettings {
                    language: None,
                    cultural_preference: update.cultural_preference,
                    accent: Some("indian".into()),
                })
            });
        backend.expect_get_settings().times(0);

        let cache = SettingsCache::new(store.clone(), Arc::new(backend), WINDOW_MS);
        cache
            .update_settings(SettingsUpdate {
                cultural_preference: Some("punjabi".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            store.get(keys::SETTINGS_JUST_UPDATED).await.unwrap().as_deref(),
            Some("true")
        );

        // Next mount is served from the cache
        let snapshot = cache.fetch_user_settings().await;
        assert_eq!(snapshot.preferences.cultural_preference, "punjabi");
    }
}
