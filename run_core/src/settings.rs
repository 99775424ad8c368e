//! Settings persistence.
//!
//! Settings live under their own key, separate from the workouts array.
//! A stored object only needs the fields it changes; the rest fall back to
//! defaults.

use crate::storage::KeyValueStore;
use crate::{ParseFailure, Result, Settings, Theme, Units};

/// Key holding the JSON settings object
pub const SETTINGS_KEY: &str = "runTracker.settings";

/// Decode a stored settings object, merging it over the defaults
pub fn decode_settings(raw: &str) -> std::result::Result<Settings, ParseFailure> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ParseFailure::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(ParseFailure::NotAnObject);
    }
    serde_json::from_value(value).map_err(|e| ParseFailure::Malformed(e.to_string()))
}

impl Settings {
    /// Load settings from the backend.
    ///
    /// Returns defaults if the key is absent, unreadable or corrupted.
    pub fn load<S: KeyValueStore>(backend: &S) -> Self {
        match backend.get(SETTINGS_KEY) {
            Ok(Some(raw)) => match decode_settings(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Could not parse settings: {}. Using defaults.", e);
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("Could not read settings: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore>(&self, backend: &mut S) -> Result<()> {
        let json = serde_json::to_string(self)?;
        backend.set(SETTINGS_KEY, &json)?;
        tracing::debug!("Saved settings: theme={}, units={}", self.theme, self.units);
        Ok(())
    }

    /// Flip between light and dark, returning the new theme
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_load_missing_returns_default() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        assert_eq!(settings.toggle_theme(), Theme::Dark);
        settings.set_units(Units::Imperial);
        settings.save(&mut store).unwrap();

        let loaded = Settings::load(&store);
        assert_eq!(loaded.theme, Theme::Dark);
        assert_eq!(loaded.units, Units::Imperial);
    }

    #[test]
    fn test_partial_object_merges_over_defaults() {
        let store = MemoryStore::new();
        store.insert(SETTINGS_KEY, r#"{"units":"imperial"}"#);

        let loaded = Settings::load(&store);
        assert_eq!(loaded.theme, Theme::Light);
        assert_eq!(loaded.units, Units::Imperial);
    }

    #[test]
    fn test_corrupted_settings_fall_back() {
        let store = MemoryStore::new();
        store.insert(SETTINGS_KEY, "{ invalid json }");
        assert_eq!(Settings::load(&store), Settings::default());

        assert_eq!(decode_settings("[1,2]"), Err(ParseFailure::NotAnObject));
        assert!(matches!(
            decode_settings(r#"{"theme":"neon"}"#),
            Err(ParseFailure::Malformed(_))
        ));
    }
}
