//! Location record types.
//!
//! Two shapes of record exist on disk and on the wire:
//!
//! - **Stored** records are the flat [`LocationData`] produced by parsing the
//!   local save file.
//! - **Remote** records are [`Location`] envelopes returned by the community
//!   database, with the flat data nested under `data` and the sharing metadata
//!   (image, description, teleport count) alongside it.
//!
//! [`LocationEntry`] accepts either shape and normalises it into a
//! [`Location`]. Fields this crate does not model are kept in `extra` so a
//! snapshot written back to disk is unchanged.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::coords::Coords;

/// The flat record describing one discovered planet or system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationData {
    /// Identity key of the record. Maintenance deduplicates on this field.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// The discovering user.
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    /// The label the user attached, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_z: Option<f64>,
    /// Portal-style address, `"XXXX:YYYY:ZZZZ:PPPP"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_id: Option<String>,
    #[serde(rename = "VoxelX", default, skip_serializing_if = "Option::is_none")]
    pub voxel_x: Option<i64>,
    #[serde(rename = "VoxelY", default, skip_serializing_if = "Option::is_none")]
    pub voxel_y: Option<i64>,
    #[serde(rename = "VoxelZ", default, skip_serializing_if = "Option::is_none")]
    pub voxel_z: Option<i64>,
    /// Galaxy index, `0` is the starting galaxy.
    #[serde(default, deserialize_with = "null_as_default")]
    pub galaxy: u32,
    /// Milliseconds since the Unix epoch at which the record was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<i64>,
    /// The record marks a player base rather than a plain discovery.
    #[serde(default, deserialize_with = "null_as_default")]
    pub base: bool,
    /// The record was shared from a console player.
    #[serde(rename = "ps4", default, deserialize_with = "null_as_default")]
    pub ps4: bool,
    /// Installed modifications at capture time.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub mods: Vec<String>,
    /// Unmodelled fields, round-tripped verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocationData {
    /// Returns the translated coordinate triple, or `None` if any axis is
    /// missing.
    #[must_use]
    pub fn coords(&self) -> Option<Coords> {
        Some(Coords::new(
            self.translated_x?,
            self.translated_y?,
            self.translated_z?,
        ))
    }

    /// The label shown for this record: its name when non-empty, otherwise
    /// its id.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

/// A shared location as returned by the community database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Server-side identifier of the share.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// The underlying record.
    pub data: LocationData,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    /// How many users travelled here through the companion.
    #[serde(default, deserialize_with = "null_as_default")]
    pub teleports: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Location {
    /// Wrap a stored record with a fresh identifier and empty sharing
    /// metadata.
    #[must_use]
    pub fn from_stored(data: LocationData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: data.username.clone(),
            data,
            ..Self::default()
        }
    }
}

/// Parse each element of `items` on its own, skipping those that do not
/// deserialize as `T`.
#[must_use]
pub fn parse_records<T: DeserializeOwned>(items: &[Value], what: &str) -> Vec<T> {
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(record) => records.push(record),
            Err(err) => tracing::warn!(index, %err, %what, "skipping malformed record"),
        }
    }
    records
}

/// Deserialize a `null` as the field's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Either shape of location record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationEntry {
    /// A remote envelope (has a `data` member).
    Remote(Location),
    /// A flat stored record.
    Stored(LocationData),
}

impl LocationEntry {
    /// Returns the inner record regardless of shape.
    #[must_use]
    pub fn data(&self) -> &LocationData {
        match self {
            Self::Remote(location) => &location.data,
            Self::Stored(data) => data,
        }
    }

    /// Normalise into a [`Location`] envelope.
    #[must_use]
    pub fn into_location(self) -> Location {
        match self {
            Self::Remote(location) => location,
            Self::Stored(data) => Location::from_stored(data),
        }
    }
}

impl From<LocationData> for LocationEntry {
    fn from(data: LocationData) -> Self {
        Self::Stored(data)
    }
}

impl From<Location> for LocationEntry {
    fn from(location: Location) -> Self {
        Self::Remote(location)
    }
}

/// One page-accumulated view of the remote location list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLocations {
    #[serde(default)]
    pub results: Vec<Location>,
    /// Total count reported by the server (or the local length after
    /// maintenance).
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: usize,
    /// URL of the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page, if any.
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub multiple_selected_locations: bool,
}

impl RemoteLocations {
    /// Build a page holding exactly `results`.
    #[must_use]
    pub fn from_results(results: Vec<Location>) -> Self {
        Self {
            count: results.len(),
            results,
            ..Self::default()
        }
    }

    /// Parse a cached `remoteLocations` value.
    ///
    /// The cache may hold a bare array (the initial default), `null`, or a
    /// page object. Anything without a `results` array becomes an empty page.
    /// Records are parsed one at a time; a malformed record is skipped and
    /// the rest of the page is kept.
    #[must_use]
    pub fn from_cache_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        let Some(Value::Array(items)) = map.get("results") else {
            return Self::default();
        };

        let mut header = map.clone();
        header.remove("results");
        let mut page: Self = serde_json::from_value(Value::Object(header)).unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring malformed remote page fields");
            Self::default()
        });
        page.results = parse_records(items, "cached remote location");
        page
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
