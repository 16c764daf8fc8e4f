//! The persisted settings bag.
//!
//! [`Settings`] holds exactly the keys in [`SETTINGS_KEYS`]. Only these keys
//! are written to `settings.json`, and only these keys are read back from it.

use nmc_location::{LocationData, ShowFlags, parse_records};
use nmc_worker::Document;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Keys persisted to the settings file, in their on-disk spelling.
pub const SETTINGS_KEYS: [&str; 30] = [
    "maintenanceTS",
    "wallpaper",
    "installDirectory",
    "saveDirectory",
    "username",
    "mapLines",
    "map3d",
    "mapDrawDistance",
    "show",
    "filterOthers",
    "useGAFormat",
    "remoteLocationsColumns",
    "sortStoredByTime",
    "pollRate",
    "mode",
    "storedBases",
    "storedLocations",
    "favorites",
    "autoCapture",
    "ps4User",
    "compactRemote",
    "offline",
    "showOnlyNames",
    "showOnlyDesc",
    "showOnlyScreenshots",
    "showOnlyGalaxy",
    "showOnlyBases",
    "showOnlyPC",
    "sortByDistance",
    "sortByModded",
];

/// Returns `true` if `key` is persisted to the settings file.
#[must_use]
pub fn is_settings_key(key: &str) -> bool {
    SETTINGS_KEYS.contains(&key)
}

/// User preferences and locally captured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Milliseconds since the epoch of the last maintenance sweep.
    #[serde(rename = "maintenanceTS")]
    pub maintenance_ts: i64,
    pub wallpaper: Option<String>,
    pub install_directory: Option<String>,
    pub save_directory: Option<String>,
    pub username: String,
    pub map_lines: bool,
    pub map3d: bool,
    pub map_draw_distance: bool,
    pub show: ShowFlags,
    pub filter_others: bool,
    #[serde(rename = "useGAFormat")]
    pub use_ga_format: bool,
    pub remote_locations_columns: u8,
    pub sort_stored_by_time: bool,
    /// Remote refresh interval in milliseconds.
    pub poll_rate: u64,
    /// Game mode whose save is tracked (`"normal"`, `"creative"`, …).
    pub mode: String,
    /// Base records captured from the save; opaque to the store.
    pub stored_bases: Vec<Value>,
    #[serde(deserialize_with = "lenient_locations")]
    pub stored_locations: Vec<LocationData>,
    /// Ids of favourited remote records.
    pub favorites: Vec<String>,
    pub auto_capture: bool,
    pub ps4_user: bool,
    pub compact_remote: bool,
    pub offline: bool,
    pub show_only_names: bool,
    pub show_only_desc: bool,
    pub show_only_screenshots: bool,
    pub show_only_galaxy: bool,
    pub show_only_bases: bool,
    #[serde(rename = "showOnlyPC")]
    pub show_only_pc: bool,
    pub sort_by_distance: bool,
    pub sort_by_modded: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            maintenance_ts: 0,
            wallpaper: None,
            install_directory: None,
            save_directory: None,
            username: "Explorer".to_string(),
            map_lines: false,
            map3d: false,
            map_draw_distance: false,
            show: ShowFlags::default(),
            filter_others: false,
            use_ga_format: false,
            remote_locations_columns: 1,
            sort_stored_by_time: false,
            poll_rate: 60_000,
            mode: "normal".to_string(),
            stored_bases: Vec::new(),
            stored_locations: Vec::new(),
            favorites: Vec::new(),
            auto_capture: false,
            ps4_user: cfg!(target_os = "macos"),
            compact_remote: false,
            offline: false,
            show_only_names: false,
            show_only_desc: false,
            show_only_screenshots: false,
            show_only_galaxy: false,
            show_only_bases: false,
            show_only_pc: false,
            sort_by_distance: false,
            sort_by_modded: false,
        }
    }
}

impl Settings {
    /// The bag as a document, keyed by [`SETTINGS_KEYS`].
    #[must_use]
    pub fn to_document(&self) -> Document {
        match serde_json::to_value(self) {
            Ok(Value::Object(document)) => document,
            _ => Document::new(),
        }
    }

    /// Overwrite every field present in `patch`.
    pub fn apply(&mut self, patch: SettingsPatch) {
        let target = self;
        macro_rules! assign {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field {
                    target.$field = value;
                })*
            };
        }
        assign!(
            maintenance_ts,
            wallpaper,
            install_directory,
            save_directory,
            username,
            map_lines,
            map3d,
            map_draw_distance,
            show,
            filter_others,
            use_ga_format,
            remote_locations_columns,
            sort_stored_by_time,
            poll_rate,
            mode,
            stored_bases,
            stored_locations,
            favorites,
            auto_capture,
            ps4_user,
            compact_remote,
            offline,
            show_only_names,
            show_only_desc,
            show_only_screenshots,
            show_only_galaxy,
            show_only_bases,
            show_only_pc,
            sort_by_distance,
            sort_by_modded,
        );
    }
}

/// Deserialise a present field into `Some`, keeping `null` as `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserialise stored locations one record at a time, dropping malformed
/// records. `null` is an empty list.
fn lenient_locations<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<LocationData>, D::Error> {
    optional_lenient_locations(deserializer).map(Option::unwrap_or_default)
}

fn optional_lenient_locations<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<LocationData>>, D::Error> {
    let items = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(items.map(|items| parse_records(&items, "stored location")))
}

/// A partial update of [`Settings`]. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(rename = "maintenanceTS", default, skip_serializing_if = "Option::is_none")]
    pub maintenance_ts: Option<i64>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub wallpaper: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub install_directory: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub save_directory: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_lines: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map3d: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_draw_distance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<ShowFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_others: Option<bool>,
    #[serde(rename = "useGAFormat", default, skip_serializing_if = "Option::is_none")]
    pub use_ga_format: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_locations_columns: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_stored_by_time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_rate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_bases: Option<Vec<Value>>,
    #[serde(
        default,
        deserialize_with = "optional_lenient_locations",
        skip_serializing_if = "Option::is_none"
    )]
    pub stored_locations: Option<Vec<LocationData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_capture: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ps4_user: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact_remote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_only_names: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_only_desc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_only_screenshots: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_only_galaxy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_only_bases: Option<bool>,
    #[serde(rename = "showOnlyPC", default, skip_serializing_if = "Option::is_none")]
    pub show_only_pc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by_distance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by_modded: Option<bool>,
}

impl SettingsPatch {
    /// Build a patch from a settings document.
    ///
    /// Keys outside [`SETTINGS_KEYS`] and `null` values are ignored. Each key
    /// is parsed on its own, so one malformed value does not discard the
    /// rest; malformed keys are returned alongside the patch.
    #[must_use]
    pub fn from_document(document: &Document) -> (Self, Vec<String>) {
        let mut patch = Self::default();
        let mut rejected = Vec::new();

        for (key, value) in document {
            if !is_settings_key(key) || value.is_null() {
                continue;
            }
            let mut single = Document::new();
            single.insert(key.clone(), value.clone());
            match serde_json::from_value::<Self>(Value::Object(single)) {
                Ok(parsed) => patch.merge(parsed),
                Err(err) => {
                    warn!(%key, %err, "ignoring malformed setting");
                    rejected.push(key.clone());
                }
            }
        }
        (patch, rejected)
    }

    /// Take every field present in `other`.
    pub fn merge(&mut self, other: Self) {
        let target = self;
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if other.$field.is_some() {
                    target.$field = other.$field;
                })*
            };
        }
        take!(
            maintenance_ts,
            wallpaper,
            install_directory,
            save_directory,
            username,
            map_lines,
            map3d,
            map_draw_distance,
            show,
            filter_others,
            use_ga_format,
            remote_locations_columns,
            sort_stored_by_time,
            poll_rate,
            mode,
            stored_bases,
            stored_locations,
            favorites,
            auto_capture,
            ps4_user,
            compact_remote,
            offline,
            show_only_names,
            show_only_desc,
            show_only_screenshots,
            show_only_galaxy,
            show_only_bases,
            show_only_pc,
            sort_by_distance,
            sort_by_modded,
        );
    }

    /// The present fields as `(key, value)` pairs in their on-disk spelling.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        match serde_json::to_value(self) {
            Ok(Value::Object(document)) => document.into_iter().collect(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
