//! Application state and partial updates.

use std::path::PathBuf;

use nmc_location::{GalaxyOption, LocationData, RemoteLocations};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StoreConfig;
use crate::settings::{Settings, SettingsPatch, double_option};

/// Window title while connected.
pub const TITLE_ONLINE: &str = "NO MAN'S CONNECT";

/// Window title in offline mode.
pub const TITLE_OFFLINE: &str = "NO MAN'S DISCONNECT";

/// The complete application state.
///
/// [`Settings`] is the persisted part; everything else lives for one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub version: String,
    pub api_base: String,
    pub machine_id: Option<String>,
    /// `true` until the first successful remote sync.
    pub init: bool,
    pub home_dir: PathBuf,
    pub config_dir: PathBuf,
    pub title: String,
    pub save_file_name: String,
    pub profile: Option<Value>,
    #[serde(flatten)]
    pub settings: Settings,
    pub remote_locations: RemoteLocations,
    /// Length of the remote list as of the last update that carried one.
    pub remote_length: usize,
    /// Id of the stored record the player is at.
    pub current_location: Option<String>,
    pub selected_location: Option<LocationData>,
    pub selected_galaxy: u32,
    pub galaxy_options: Vec<GalaxyOption>,
    pub search: String,
    pub search_in_progress: bool,
    pub search_cache: RemoteLocations,
    pub page: usize,
    pub page_size: usize,
    pub pagination_enabled: bool,
    pub loading: bool,
    /// Always empty after a `set`; errors go to the reporter.
    pub error: String,
}

impl AppState {
    /// Initial state for a session configured by `config`.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            api_base: config.api_base.clone(),
            machine_id: None,
            init: true,
            home_dir: config.home_dir.clone(),
            config_dir: config.config_dir.clone(),
            title: TITLE_ONLINE.to_string(),
            save_file_name: String::new(),
            profile: None,
            settings: Settings::default(),
            remote_locations: RemoteLocations::default(),
            remote_length: 0,
            current_location: None,
            selected_location: None,
            selected_galaxy: 0,
            galaxy_options: Vec::new(),
            search: String::new(),
            search_in_progress: false,
            search_cache: RemoteLocations::default(),
            page: 1,
            page_size: config.page_size,
            pagination_enabled: true,
            loading: false,
            error: String::new(),
        }
    }

    /// Shallow-merge `patch`: every present field replaces the current value.
    pub fn apply(&mut self, patch: StatePatch) {
        let target = self;
        macro_rules! assign {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field {
                    target.$field = value;
                })*
            };
        }
        assign!(
            machine_id,
            init,
            title,
            save_file_name,
            profile,
            remote_locations,
            current_location,
            selected_location,
            selected_galaxy,
            galaxy_options,
            search,
            search_in_progress,
            search_cache,
            page,
            pagination_enabled,
            loading,
            error,
        );
        target.settings.apply(patch.settings);
    }
}

/// A partial update of [`AppState`].
///
/// Absent fields are left untouched. Persisted fields live in
/// [`SettingsPatch`], flattened into the same JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(flatten)]
    pub settings: SettingsPatch,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_file_name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub profile: Option<Option<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_locations: Option<RemoteLocations>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub current_location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub selected_location: Option<Option<LocationData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_galaxy: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub galaxy_options: Option<Vec<GalaxyOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_in_progress: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_cache: Option<RemoteLocations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatePatch {
    /// A patch touching only persisted settings.
    #[must_use]
    pub fn settings(settings: SettingsPatch) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn state() -> AppState {
        AppState::new(&StoreConfig::new("/tmp/nmc"))
    }

    #[test]
    fn test_initial_state() {
        let state = state();
        assert!(state.init);
        assert_eq!(state.title, TITLE_ONLINE);
        assert_eq!(state.page, 1);
        assert_eq!(state.page_size, 60);
        assert!(state.selected_location.is_none());
    }

    #[test]
    fn test_apply_is_shallow() {
        let mut state = state();
        state.search = "Eden".to_string();
        state.apply(StatePatch {
            loading: Some(true),
            settings: SettingsPatch {
                username: Some("Nova".to_string()),
                ..SettingsPatch::default()
            },
            ..StatePatch::default()
        });
        assert!(state.loading);
        assert_eq!(state.settings.username, "Nova");
        assert_eq!(state.search, "Eden");
    }

    #[test]
    fn test_patch_parses_mixed_keys() {
        let patch: StatePatch = serde_json::from_value(json!({
            "map3d": true,
            "search": "Sector 0469",
            "selectedLocation": null
        }))
        .unwrap();
        assert_eq!(patch.settings.map3d, Some(true));
        assert_eq!(patch.search.as_deref(), Some("Sector 0469"));
        assert_eq!(patch.selected_location, Some(None));
        assert_eq!(patch.current_location, None);
    }

    #[test]
    fn test_state_serialises_settings_inline() {
        let value = serde_json::to_value(state()).unwrap();
        assert_eq!(value["username"], json!("Explorer"));
        assert_eq!(value["pageSize"], json!(60));
        assert!(value.get("settings").is_none());
    }
}
