//! Store configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// The environment variable used to override the config directory.
pub const CONFIG_DIR_ENV: &str = "NMC_CONFIG_DIR";

/// Default base URL of the community database.
pub const DEFAULT_API_BASE: &str = "https://neuropuff.com/api/";

/// How often the maintenance sweep may run: one week.
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_millis(604_800_000);

/// Default number of remote records per page.
pub const DEFAULT_PAGE_SIZE: usize = 60;

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the cache and settings files.
    pub config_dir: PathBuf,
    /// The user's home directory, searched for the game's save directory.
    pub home_dir: PathBuf,
    /// File name of the remote location cache.
    pub cache_file: String,
    /// File name of the settings bag.
    pub settings_file: String,
    /// Minimum time between maintenance sweeps.
    pub maintenance_interval: Duration,
    /// Remote records per page.
    pub page_size: usize,
    /// Base URL of the community database.
    pub api_base: String,
}

impl StoreConfig {
    /// Create a config rooted at `config_dir`, with the home directory taken
    /// from the environment.
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            home_dir: home_dir(),
            cache_file: "cache.json".to_string(),
            settings_file: "settings.json".to_string(),
            maintenance_interval: MAINTENANCE_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Create a config from the `NMC_CONFIG_DIR` environment variable,
    /// falling back to `<home>/.nmc`.
    #[must_use]
    pub fn from_env() -> Self {
        let config_dir = std::env::var_os(CONFIG_DIR_ENV)
            .map_or_else(|| home_dir().join(".nmc"), PathBuf::from);
        Self::new(config_dir)
    }

    #[must_use]
    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = home_dir.into();
        self
    }

    #[must_use]
    pub fn with_maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = interval;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Locate the game's save directory under the home directory.
    ///
    /// Checks the Steam layout first, then the GOG layout.
    #[must_use]
    pub fn detect_save_directory(&self) -> Option<PathBuf> {
        save_directory_candidates(&self.home_dir)
            .into_iter()
            .find(|path| path.is_dir())
    }

    /// The maintenance interval in milliseconds.
    #[must_use]
    pub fn maintenance_interval_ms(&self) -> i64 {
        i64::try_from(self.maintenance_interval.as_millis()).unwrap_or(i64::MAX)
    }
}

fn save_directory_candidates(home: &Path) -> [PathBuf; 2] {
    let steam = home
        .join("AppData")
        .join("Roaming")
        .join("HelloGames")
        .join("NMS");
    let gog = steam.join("DefaultUser");
    [steam, gog]
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::new("/tmp/nmc");
        assert_eq!(config.cache_file, "cache.json");
        assert_eq!(config.settings_file, "settings.json");
        assert_eq!(config.page_size, 60);
        assert_eq!(config.maintenance_interval_ms(), 604_800_000);
    }

    #[test]
    fn test_page_size_never_zero() {
        assert_eq!(StoreConfig::new("/tmp/nmc").with_page_size(0).page_size, 1);
    }

    #[test]
    fn test_detect_save_directory_prefers_steam() {
        let home = std::env::temp_dir().join(format!("nmc-home-{}", uuid::Uuid::new_v4()));
        let config = StoreConfig::new(home.join("cfg")).with_home_dir(&home);
        assert_eq!(config.detect_save_directory(), None);

        let [steam, gog] = save_directory_candidates(&home);
        std::fs::create_dir_all(&gog).unwrap();
        assert_eq!(config.detect_save_directory(), Some(steam.clone()));
        assert!(gog.starts_with(&steam));

        let _ = std::fs::remove_dir_all(home);
    }
}
