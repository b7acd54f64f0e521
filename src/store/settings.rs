//! Dashboard settings store.
//!
//! Settings are a closed set of typed fields. Changes go through
//! [`SettingUpdate`], one variant per field, so a key/value pair from the
//! command line or a keybinding is validated once, at the boundary.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use telewatch_types::{RateError, RefreshRate};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

/// Highest accepted notification volume.
pub const MAX_VOLUME: u8 = 100;

/// Which colour scheme the dashboard uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Pick from the terminal background.
    #[default]
    Auto,
    /// Dark backgrounds.
    Dark,
    /// Light backgrounds.
    Light,
}

impl ThemeMode {
    /// The mode after this one when cycling auto, dark, light.
    pub fn next(self) -> Self {
        match self {
            ThemeMode::Auto => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Auto,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThemeMode::Auto => "auto",
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        })
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ThemeMode::Auto),
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            other => Err(format!("expected auto, dark or light, got {:?}", other)),
        }
    }
}

/// Dashboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Show notification sequences at all.
    pub notifications: bool,
    /// Play notification sounds.
    pub sounds: bool,
    /// Notification volume, 0 to [`MAX_VOLUME`].
    #[serde(deserialize_with = "deserialize_volume")]
    pub volume: u8,
    /// Colour scheme.
    pub theme: ThemeMode,
    /// Push cadence requested from the telemetry server.
    pub refresh_rate: RefreshRate,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            sounds: true,
            volume: 80,
            theme: ThemeMode::Auto,
            refresh_rate: RefreshRate::default(),
        }
    }
}

/// Reject volumes above [`MAX_VOLUME`] when loading settings.
fn deserialize_volume<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let volume = u8::deserialize(deserializer)?;
    if volume > MAX_VOLUME {
        return Err(D::Error::custom(format!(
            "volume {} is above the maximum of {}",
            volume, MAX_VOLUME
        )));
    }
    Ok(volume)
}

/// Errors from parsing a setting update.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingError {
    /// No setting has this name.
    #[error("unknown setting {0:?}")]
    UnknownKey(String),

    /// The value does not fit the setting.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Setting the value was meant for.
        key: &'static str,
        /// The rejected input, as given.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A change to exactly one setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingUpdate {
    /// Turn notification sequences on or off.
    Notifications(bool),
    /// Turn notification sounds on or off.
    Sounds(bool),
    /// Set the volume; values above [`MAX_VOLUME`] are clamped.
    Volume(u8),
    /// Switch colour scheme.
    Theme(ThemeMode),
    /// Change the push cadence requested on the next `start`.
    RefreshRate(RefreshRate),
}

impl SettingUpdate {
    /// Parse a `key = value` pair, e.g. `("volume", "40")`.
    ///
    /// # Example
    ///
    /// ```
    /// use telewatch::store::SettingUpdate;
    ///
    /// assert_eq!(SettingUpdate::parse("volume", "40"), Ok(SettingUpdate::Volume(40)));
    /// assert!(SettingUpdate::parse("volume", "400").is_err());
    /// assert!(SettingUpdate::parse("camera", "front").is_err());
    /// ```
    pub fn parse(key: &str, value: &str) -> Result<Self, SettingError> {
        let value = value.trim();
        match key.trim() {
            "notifications" => parse_bool("notifications", value).map(Self::Notifications),
            "sounds" => parse_bool("sounds", value).map(Self::Sounds),
            "volume" => {
                let volume: u8 = value
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid("volume", value, e.to_string()))?;
                if volume > MAX_VOLUME {
                    return Err(invalid("volume", value, format!("must be at most {}", MAX_VOLUME)));
                }
                Ok(Self::Volume(volume))
            }
            "theme" => value
                .parse()
                .map(Self::Theme)
                .map_err(|reason| invalid("theme", value, reason)),
            "refresh_rate" => value
                .parse()
                .map(Self::RefreshRate)
                .map_err(|e: RateError| invalid("refresh_rate", value, e.to_string())),
            other => Err(SettingError::UnknownKey(other.to_string())),
        }
    }

    /// The setting this update targets.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Notifications(_) => "notifications",
            Self::Sounds(_) => "sounds",
            Self::Volume(_) => "volume",
            Self::Theme(_) => "theme",
            Self::RefreshRate(_) => "refresh_rate",
        }
    }

    /// Write this update into `settings`.
    pub fn apply_to(self, settings: &mut Settings) {
        match self {
            Self::Notifications(on) => settings.notifications = on,
            Self::Sounds(on) => settings.sounds = on,
            Self::Volume(volume) => settings.volume = volume.min(MAX_VOLUME),
            Self::Theme(theme) => settings.theme = theme,
            Self::RefreshRate(rate) => settings.refresh_rate = rate,
        }
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, SettingError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, value, "expected on/off".to_string())),
    }
}

fn invalid(key: &'static str, value: &str, reason: String) -> SettingError {
    SettingError::InvalidValue {
        key,
        value: value.to_string(),
        reason,
    }
}

/// Reactive settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    state: Arc<watch::Sender<Settings>>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsStore {
    /// Create a store holding `initial`.
    pub fn new(initial: Settings) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            state: Arc::new(tx),
        }
    }

    /// A copy of the current settings.
    pub fn get(&self) -> Settings {
        self.state.borrow().clone()
    }

    /// Subscribe to changes.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.state.subscribe()
    }

    /// Apply one update. Readers are only woken if the value actually changed.
    pub fn apply(&self, update: SettingUpdate) {
        let changed = self.state.send_if_modified(|settings| {
            let before = settings.clone();
            update.apply_to(settings);
            *settings != before
        });
        if changed {
            info!(setting = update.key(), ?update, "setting changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_key() {
        assert_eq!(
            SettingUpdate::parse("notifications", "off"),
            Ok(SettingUpdate::Notifications(false))
        );
        assert_eq!(SettingUpdate::parse("sounds", "YES"), Ok(SettingUpdate::Sounds(true)));
        assert_eq!(
            SettingUpdate::parse("theme", "Light"),
            Ok(SettingUpdate::Theme(ThemeMode::Light))
        );
        assert_eq!(
            SettingUpdate::parse("refresh_rate", "20"),
            Ok(SettingUpdate::RefreshRate(RefreshRate::new(20).unwrap()))
        );
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(matches!(
            SettingUpdate::parse("refresh_rate", "1.5"),
            Err(SettingError::InvalidValue { key: "refresh_rate", .. })
        ));
        assert!(matches!(
            SettingUpdate::parse("sounds", "maybe"),
            Err(SettingError::InvalidValue { key: "sounds", .. })
        ));
        assert_eq!(
            SettingUpdate::parse("camera_mode", "front"),
            Err(SettingError::UnknownKey("camera_mode".to_string()))
        );
    }

    #[test]
    fn test_apply_notifies_only_on_change() {
        let store = SettingsStore::default();
        let mut rx = store.subscribe();

        store.apply(SettingUpdate::Volume(80));
        assert!(!rx.has_changed().unwrap());

        store.apply(SettingUpdate::Volume(30));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().volume, 30);
        assert_eq!(store.get().volume, 30);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"sounds": false, "theme": "dark"}"#).unwrap();
        assert!(!settings.sounds);
        assert!(settings.notifications);
        assert_eq!(settings.theme, ThemeMode::Dark);
        assert_eq!(settings.refresh_rate.get(), 10);
    }

    #[test]
    fn test_settings_reject_volume_above_maximum() {
        let err = serde_json::from_str::<Settings>(r#"{"volume": 200}"#).unwrap_err();
        assert!(err.to_string().contains("maximum"));

        let settings: Settings = serde_json::from_str(r#"{"volume": 100}"#).unwrap();
        assert_eq!(settings.volume, MAX_VOLUME);
    }
}
