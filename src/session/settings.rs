use serde_json::Value;
use tracing::warn;

use crate::models::{SettingKey, Settings};

/// Local copy of the shared editor settings.
///
/// Local changes are recorded once their write succeeds, and remote
/// snapshots are applied only where they differ, so a client's own echoed
/// write is a no-op.
#[derive(Debug, Default)]
pub struct SettingsSync {
    local: Settings,
}

impl SettingsSync {
    pub fn local(&self) -> &Settings {
        &self.local
    }

    pub fn get(&self, key: SettingKey) -> Option<&str> {
        match key {
            SettingKey::Language => self.local.language.as_deref(),
            SettingKey::Theme => self.local.theme.as_deref(),
        }
    }

    /// Record a local change. Returns false when the value is already current.
    pub fn set_local(&mut self, key: SettingKey, value: &str) -> bool {
        let slot = self.slot(key);
        if slot.as_deref() == Some(value) {
            return false;
        }
        *slot = Some(value.to_string());
        true
    }

    /// Apply a `settings` snapshot. Returns the new settings when anything changed.
    pub fn apply_remote(&mut self, snapshot: &Value) -> Option<Settings> {
        let remote: Settings = if snapshot.is_null() {
            Settings::default()
        } else {
            match serde_json::from_value(snapshot.clone()) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Ignoring malformed settings snapshot: {}", e);
                    return None;
                }
            }
        };

        let mut changed = false;
        for (key, value) in [(SettingKey::Language, remote.language), (SettingKey::Theme, remote.theme)] {
            if let Some(value) = value {
                changed |= self.set_local(key, &value);
            }
        }
        changed.then(|| self.local.clone())
    }

    fn slot(&mut self, key: SettingKey) -> &mut Option<String> {
        match key {
            SettingKey::Language => &mut self.local.language,
            SettingKey::Theme => &mut self.local.theme,
        }
    }
}

impl SettingKey {
    pub fn field(&self) -> &'static str {
        match self {
            SettingKey::Language => "language",
            SettingKey::Theme => "theme",
        }
    }
}
