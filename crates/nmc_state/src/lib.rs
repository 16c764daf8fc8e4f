//! # nmc_state
//!
//! The application store of the galaxy companion.
//!
//! A [`Store`] owns the [`AppState`], an explicit list of observers and the
//! handles of two persistence workers. Updates are shallow-merged
//! [`StatePatch`]es; keys of the persisted [`Settings`] bag are forwarded to
//! the settings worker one key at a time.
//!
//! - [`store`]: the store itself and its worker event handling.
//! - [`state`]: application state and partial updates.
//! - [`settings`]: the persisted settings bag.
//! - [`migration`]: import from the legacy key-value settings.
//! - [`config`]: file locations and intervals.

pub mod clock;
pub mod config;
pub mod error;
pub mod migration;
pub mod observer;
pub mod report;
pub mod settings;
pub mod state;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use config::{CONFIG_DIR_ENV, StoreConfig};
pub use error::StateError;
pub use migration::{JsonFileLegacy, LegacySource, migrate};
pub use observer::{Observer, Subscription};
pub use report::{ErrorReporter, LogReporter};
pub use settings::{SETTINGS_KEYS, Settings, SettingsPatch, is_settings_key};
pub use state::{AppState, StatePatch, TITLE_OFFLINE, TITLE_ONLINE};
pub use store::Store;
