//! Typed key/value settings consumed by the eligibility calculator and other
//! configuration-driven pieces. The portal treats the settings store as an
//! external collaborator; this module defines the seam plus an in-memory
//! adapter used by the service binary and the test suites.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Typed value held behind a settings key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum SettingValue {
    Number(f64),
    Flag(bool),
    Text(String),
    List(Vec<serde_json::Value>),
}

/// Whether a setting may be exposed to citizen-facing surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

/// One configuration entry as stored by the settings collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: SettingValue,
    pub visibility: Visibility,
}

/// Lookup failures surfaced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("setting '{0}' is not defined")]
    Missing(String),
    #[error("setting '{key}' holds a {actual}, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl SettingValue {
    const fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Number(_) => "number",
            SettingValue::Flag(_) => "flag",
            SettingValue::Text(_) => "text",
            SettingValue::List(_) => "list",
        }
    }
}

/// Read seam over the configuration store.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Setting>;

    fn number(&self, key: &str) -> Result<f64, SettingsError> {
        match self.get(key) {
            None => Err(SettingsError::Missing(key.to_string())),
            Some(setting) => match setting.value {
                SettingValue::Number(value) => Ok(value),
                other => Err(SettingsError::WrongType {
                    key: key.to_string(),
                    expected: "number",
                    actual: other.type_name(),
                }),
            },
        }
    }

    fn optional_number(&self, key: &str) -> Result<Option<f64>, SettingsError> {
        match self.number(key) {
            Ok(value) => Ok(Some(value)),
            Err(SettingsError::Missing(_)) => Ok(None),
            Err(other) => Err(other),
        }
    }

    fn flag(&self, key: &str) -> Result<bool, SettingsError> {
        match self.get(key) {
            None => Err(SettingsError::Missing(key.to_string())),
            Some(setting) => match setting.value {
                SettingValue::Flag(value) => Ok(value),
                other => Err(SettingsError::WrongType {
                    key: key.to_string(),
                    expected: "flag",
                    actual: other.type_name(),
                }),
            },
        }
    }

    fn text(&self, key: &str) -> Result<String, SettingsError> {
        match self.get(key) {
            None => Err(SettingsError::Missing(key.to_string())),
            Some(setting) => match setting.value {
                SettingValue::Text(value) => Ok(value),
                other => Err(SettingsError::WrongType {
                    key: key.to_string(),
                    expected: "text",
                    actual: other.type_name(),
                }),
            },
        }
    }
}

/// In-memory adapter backing the service binary and tests.
#[derive(Default, Clone)]
pub struct InMemorySettings {
    entries: Arc<RwLock<BTreeMap<String, Setting>>>,
}

impl InMemorySettings {
    pub fn put(&self, key: &str, value: SettingValue, visibility: Visibility) {
        let mut guard = self.entries.write().expect("settings lock poisoned");
        guard.insert(
            key.to_string(),
            Setting {
                key: key.to_string(),
                value,
                visibility,
            },
        );
    }

    pub fn put_number(&self, key: &str, value: f64) {
        self.put(key, SettingValue::Number(value), Visibility::Private);
    }

    /// Entries safe to show on citizen-facing screens.
    pub fn public_entries(&self) -> Vec<Setting> {
        let guard = self.entries.read().expect("settings lock poisoned");
        guard
            .values()
            .filter(|setting| setting.visibility == Visibility::Public)
            .cloned()
            .collect()
    }
}

impl SettingsStore for InMemorySettings {
    fn get(&self, key: &str) -> Option<Setting> {
        let guard = self.entries.read().expect("settings lock poisoned");
        guard.get(key).cloned()
    }
}
