//! Migration from the legacy flat key-value settings store.
//!
//! Older releases kept settings in a flat key-value store, one value per key.
//! On first start the recognised keys are copied into the settings bag; once
//! the new settings file has loaded, the legacy source is cleared.

use std::path::{Path, PathBuf};

use nmc_worker::Document;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StateError;
use crate::settings::SettingsPatch;

/// Keys copied from the legacy store when truthy.
const MIGRATED_KEYS: [&str; 16] = [
    "maintenanceTS",
    "wallpaper",
    "installDirectory",
    "saveDirectory",
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
    "favorites",
];

/// A legacy settings source.
pub trait LegacySource: Send {
    fn get(&self, key: &str) -> Option<Value>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be cleared.
    fn clear(&mut self) -> Result<(), StateError>;
}

/// A legacy store kept as one flat JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileLegacy {
    path: PathBuf,
    values: Document,
}

impl JsonFileLegacy {
    /// Load the legacy file, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the file cannot be read,
    /// [`StateError::Json`] if it is malformed and
    /// [`StateError::LegacyNotAnObject`] if it is not a JSON object.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, StateError> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_slice(&bytes)? {
            Value::Object(values) => Ok(Some(Self {
                path: path.to_path_buf(),
                values,
            })),
            _ => Err(StateError::LegacyNotAnObject),
        }
    }

    /// Wrap in-memory values; `clear` then never touches the disk.
    #[must_use]
    pub fn from_values(values: Document) -> Self {
        Self {
            path: PathBuf::new(),
            values,
        }
    }
}

impl LegacySource for JsonFileLegacy {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn clear(&mut self) -> Result<(), StateError> {
        self.values.clear();
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "legacy settings cleared");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Build a settings patch from a legacy source.
///
/// Returns `None` unless the source holds a username. `storedLocations` is
/// kept per game mode in the legacy store; the entry for the migrated mode
/// (or `current_mode`) is taken. `autoCapture` is copied whenever it is not
/// null, so a stored `false` survives.
#[must_use]
pub fn migrate(source: &dyn LegacySource, current_mode: &str) -> Option<SettingsPatch> {
    let username = source.get("username").filter(is_truthy)?;

    let mut document = Document::new();
    document.insert("username".to_string(), username);
    for key in MIGRATED_KEYS {
        if let Some(value) = source.get(key).filter(is_truthy) {
            document.insert(key.to_string(), value);
        }
    }

    let mode = document
        .get("mode")
        .and_then(Value::as_str)
        .unwrap_or(current_mode)
        .to_string();
    if let Some(stored) = source
        .get("storedLocations")
        .filter(is_truthy)
        .and_then(|by_mode| by_mode.get(&mode).cloned())
    {
        document.insert("storedLocations".to_string(), stored);
    }
    if let Some(auto_capture) = source.get("autoCapture").filter(|v| !v.is_null()) {
        document.insert("autoCapture".to_string(), auto_capture);
    }

    let (patch, rejected) = SettingsPatch::from_document(&document);
    debug!(
        keys = document.len(),
        rejected = rejected.len(),
        %mode,
        "migrated legacy settings"
    );
    Some(patch)
}
