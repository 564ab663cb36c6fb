//! Typed key-value settings store
//!
//! A small preferences file, separate from the resource cache: each
//! [`Setting`] names a key and the value to use when it is unset. Values
//! live in memory and every change is written through to a TOML file.
//!
//! ```rust,ignore
//! const STREAM_ON_CELLULAR: Setting<bool> = Setting::new("stream_on_cellular", false);
//!
//! let store = SettingsStore::open(ConfigManager::new().settings_path()).await?;
//! if store.get(&STREAM_ON_CELLULAR) { ... }
//! store.set(&STREAM_ON_CELLULAR, Some(&true)).await?;
//! ```

use crate::error::{RescacheError, RescacheResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::fs;
use tracing::{debug, warn};

/// A typed settings key with its default
#[derive(Debug, Clone)]
pub struct Setting<T> {
    key: &'static str,
    default: T,
}

impl<T> Setting<T> {
    /// Declare a setting
    pub const fn new(key: &'static str, default: T) -> Self {
        Self { key, default }
    }

    /// The setting's key
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// The value used when the setting is unset
    pub fn default_value(&self) -> &T {
        &self.default
    }
}

/// File-backed settings store
pub struct SettingsStore {
    path: PathBuf,
    values: Mutex<toml::Table>,
    // Serializes read-modify-write-persist so the file matches the last change
    persist: tokio::sync::Mutex<()>,
}

impl SettingsStore {
    /// Open the store at `path`; a missing file is an empty store
    pub async fn open(path: impl Into<PathBuf>) -> RescacheResult<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path).await {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| RescacheError::SettingsInvalid {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Settings file not found, starting empty");
                toml::Table::new()
            }
            Err(e) => {
                return Err(RescacheError::io(
                    format!("reading settings from {}", path.display()),
                    e,
                ))
            }
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
            persist: tokio::sync::Mutex::new(()),
        })
    }

    /// Settings file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current value of `setting`, or its default when unset
    ///
    /// A stored value of the wrong type is logged and reads as the default.
    pub fn get<T>(&self, setting: &Setting<T>) -> T
    where
        T: DeserializeOwned + Clone,
    {
        match self.try_get(setting.key) {
            Ok(Some(value)) => value,
            Ok(None) => setting.default.clone(),
            Err(e) => {
                warn!("{}, using default", e);
                setting.default.clone()
            }
        }
    }

    /// Stored value for `key`, if any
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> RescacheResult<Option<T>> {
        let Some(raw) = self.raw(key) else {
            return Ok(None);
        };
        raw.try_into()
            .map(Some)
            .map_err(|e: toml::de::Error| RescacheError::SettingType {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Raw stored value for `key`
    pub fn raw(&self, key: &str) -> Option<toml::Value> {
        self.lock_values().get(key).cloned()
    }

    /// Snapshot of every stored setting
    pub fn all(&self) -> toml::Table {
        self.lock_values().clone()
    }

    /// Set `setting`, or unset it when `value` is `None`
    pub async fn set<T: Serialize>(
        &self,
        setting: &Setting<T>,
        value: Option<&T>,
    ) -> RescacheResult<()> {
        match value {
            Some(value) => {
                let raw = toml::Value::try_from(value)?;
                self.set_raw(setting.key, raw).await
            }
            None => self.remove(setting.key).await.map(|_| ()),
        }
    }

    /// Store a raw value under `key`
    pub async fn set_raw(&self, key: &str, value: toml::Value) -> RescacheResult<()> {
        let _persist = self.persist.lock().await;
        let snapshot = {
            let mut values = self.lock_values();
            values.insert(key.to_string(), value);
            values.clone()
        };
        self.write(&snapshot).await
    }

    /// Remove `key`; returns whether it was set
    pub async fn remove(&self, key: &str) -> RescacheResult<bool> {
        let _persist = self.persist.lock().await;
        let snapshot = {
            let mut values = self.lock_values();
            if values.remove(key).is_none() {
                return Ok(false);
            }
            values.clone()
        };
        self.write(&snapshot).await?;
        Ok(true)
    }

    async fn write(&self, values: &toml::Table) -> RescacheResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                RescacheError::io(format!("creating {}", parent.display()), e)
            })?;
        }

        let content = toml::to_string_pretty(values)?;
        fs::write(&self.path, content).await.map_err(|e| {
            RescacheError::io(format!("writing settings to {}", self.path.display()), e)
        })
    }

    fn lock_values(&self) -> std::sync::MutexGuard<'_, toml::Table> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TOS_ACCEPTED: Setting<bool> = Setting::new("tos_accepted", false);
    const THEME_VOLUME: Setting<f64> = Setting::new("theme_song_volume", 0.75);
    const QUALITY: Setting<Option<String>> = Setting::new("auto_select_quality", None);

    async fn test_store() -> (SettingsStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::open(temp.path().join("settings.toml"))
            .await
            .unwrap();
        (store, temp)
    }

    #[tokio::test]
    async fn unset_returns_default() {
        let (store, _temp) = test_store().await;
        assert!(!store.get(&TOS_ACCEPTED));
        assert_eq!(store.get(&THEME_VOLUME), 0.75);
        assert_eq!(store.get(&QUALITY), None);
    }

    #[tokio::test]
    async fn set_persists_across_open() {
        let (store, temp) = test_store().await;
        store.set(&TOS_ACCEPTED, Some(&true)).await.unwrap();
        store.set(&QUALITY, Some(&Some("1080p".to_string()))).await.unwrap();

        let reopened = SettingsStore::open(temp.path().join("settings.toml"))
            .await
            .unwrap();
        assert!(reopened.get(&TOS_ACCEPTED));
        assert_eq!(reopened.get(&QUALITY).as_deref(), Some("1080p"));
    }

    #[tokio::test]
    async fn set_none_restores_default() {
        let (store, _temp) = test_store().await;
        store.set(&THEME_VOLUME, Some(&0.2)).await.unwrap();
        assert_eq!(store.get(&THEME_VOLUME), 0.2);

        store.set(&THEME_VOLUME, None).await.unwrap();
        assert_eq!(store.get(&THEME_VOLUME), 0.75);
        assert!(!store.remove(THEME_VOLUME.key()).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_type_reads_as_default() {
        let (store, _temp) = test_store().await;
        store
            .set_raw("tos_accepted", toml::Value::String("yes".to_string()))
            .await
            .unwrap();

        assert!(!store.get(&TOS_ACCEPTED));
        assert!(matches!(
            store.try_get::<bool>("tos_accepted"),
            Err(RescacheError::SettingType { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        std::fs::write(&path, "tos_accepted = ").unwrap();

        let result = SettingsStore::open(&path).await;
        assert!(matches!(result, Err(RescacheError::SettingsInvalid { .. })));
    }

    #[tokio::test]
    async fn all_lists_stored_values() {
        let (store, _temp) = test_store().await;
        store.set(&TOS_ACCEPTED, Some(&true)).await.unwrap();

        let all = store.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("tos_accepted"), Some(&toml::Value::Boolean(true)));
        assert_eq!(store.path().file_name().unwrap(), "settings.toml");
    }
}
