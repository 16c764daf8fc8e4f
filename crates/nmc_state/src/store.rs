//! The application store.
//!
//! [`Store`] owns the [`AppState`] and the handles of two persistence
//! workers: one for the remote location cache and one for the settings bag.
//! Every change goes through [`Store::set`], which merges the patch, runs the
//! maintenance sweep when it is due, notifies observers and forwards
//! persisted keys to the workers.

use nmc_location::{
    Location, MapInput, MapSeries, RemoteLocations, Selection, VoxelBounds, galaxy_options,
    map_series, run_maintenance, select_sector,
};
use nmc_worker::{Document, Envelope, WorkerEvent, WorkerEvents, WorkerHandle};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::error::StateError;
use crate::migration::{LegacySource, migrate};
use crate::observer::{Observer, Observers, Subscription};
use crate::report::{ErrorReporter, LogReporter};
use crate::settings::SettingsPatch;
use crate::state::{AppState, StatePatch, TITLE_OFFLINE};

/// Key of the remote location page inside the cache document.
const REMOTE_LOCATIONS_KEY: &str = "remoteLocations";

/// The owned application state and its persistence wiring.
pub struct Store {
    state: AppState,
    config: StoreConfig,
    cache: WorkerHandle,
    settings: WorkerHandle,
    observers: Observers,
    reporter: Box<dyn ErrorReporter>,
    clock: Box<dyn Clock>,
    legacy: Option<Box<dyn LegacySource>>,
    /// A legacy migration was applied and its source still needs clearing.
    migrated: bool,
}

impl Store {
    /// Create a store with the system clock and a logging error reporter.
    #[must_use]
    pub fn new(config: StoreConfig, cache: WorkerHandle, settings: WorkerHandle) -> Self {
        Self {
            state: AppState::new(&config),
            config,
            cache,
            settings,
            observers: Observers::new(),
            reporter: Box::new(LogReporter),
            clock: Box::new(SystemClock),
            legacy: None,
            migrated: false,
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Migrate settings from `legacy` during [`Store::init`].
    #[must_use]
    pub fn with_legacy(mut self, legacy: impl LegacySource + 'static) -> Self {
        self.legacy = Some(Box::new(legacy));
        self
    }

    /// Prepare the session and ask both workers to open their documents.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Worker`] if either worker has already stopped.
    pub fn init(&mut self) -> Result<(), StateError> {
        self.state.settings.maintenance_ts = self.clock.now_ms();

        if self.state.settings.save_directory.is_none()
            && let Some(dir) = self.config.detect_save_directory()
        {
            info!(path = %dir.display(), "found save directory");
            self.state.settings.save_directory = Some(dir.display().to_string());
        }

        if let Some(legacy) = self.legacy.as_deref()
            && let Some(patch) = migrate(legacy, &self.state.settings.mode)
        {
            info!(username = ?patch.username, "migrating legacy settings");
            self.state.settings.apply(patch);
            self.migrated = true;
        }

        let mut cache_default = Document::new();
        cache_default.insert(REMOTE_LOCATIONS_KEY.to_string(), Value::Array(Vec::new()));
        self.cache.open(
            self.config.cache_file.clone(),
            self.config.config_dir.clone(),
            cache_default,
        )?;
        self.settings.open(
            self.config.settings_file.clone(),
            self.config.config_dir.clone(),
            self.state.settings.to_document(),
        )?;

        info!(config_dir = %self.config.config_dir.display(), "store initialised");
        Ok(())
    }

    /// The current state.
    #[must_use]
    pub fn get(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&AppState) + Send + 'static) -> Subscription {
        let observer: Observer = Box::new(observer);
        self.observers.subscribe(observer)
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.observers.unsubscribe(subscription)
    }

    pub fn set(&mut self, patch: StatePatch) {
        self.set_with(patch, |_| {});
    }

    /// Merge `patch` into the state, then run `callback` with the result.
    ///
    /// Observers run before any persisted key is forwarded. Worker send
    /// failures are logged; the in-memory state is updated regardless.
    pub fn set_with(&mut self, mut patch: StatePatch, callback: impl FnOnce(&AppState)) {
        debug!(?patch, "state input");

        // At most one selection: the previous one goes before the new one lands.
        if patch.selected_location.is_some() {
            self.state.selected_location = None;
        }

        let mut remote_len = patch.remote_locations.as_ref().map_or(0, RemoteLocations::len);
        if remote_len == 0 && !self.state.settings.offline && !self.state.remote_locations.is_empty()
        {
            remote_len = self.state.remote_locations.len();
        }

        if let Some(remote) = patch.remote_locations.as_mut()
            && !remote.is_empty()
            && self.state.search.is_empty()
            && !self.state.remote_locations.is_empty()
        {
            let now = self.clock.now_ms();
            let due = self
                .state
                .settings
                .maintenance_ts
                .saturating_add(self.config.maintenance_interval_ms())
                < now;
            if due {
                let removed = run_maintenance(remote, VoxelBounds::GALAXY);
                info!(removed, remaining = remote.len(), "maintenance sweep ran");
                patch.settings.maintenance_ts = Some(now);
            }
            match serde_json::to_value(&*remote) {
                Ok(value) => {
                    if let Err(err) = self.cache.set(REMOTE_LOCATIONS_KEY, value) {
                        warn!(%err, "remote locations not cached");
                    }
                }
                Err(err) => warn!(%err, "remote locations not serialisable"),
            }
        }

        if patch.remote_locations.is_some() {
            self.state.remote_length = remote_len;
        }

        if let Some(error) = patch.error.as_mut()
            && !error.is_empty()
        {
            self.reporter.report(error);
            error.clear();
        }

        let entries = patch.settings.entries();
        self.state.apply(patch);
        self.observers.notify(&self.state);

        for (key, value) in entries {
            if let Err(err) = self.settings.set(key.as_str(), value) {
                warn!(%key, %err, "setting not persisted");
            }
        }
        debug!(remote = self.state.remote_locations.len(), "state");

        callback(&self.state);
    }

    /// Apply an event from the cache worker.
    pub fn handle_cache_event(&mut self, envelope: Envelope<WorkerEvent>) {
        let Some(event) = self.accept(envelope, "cache") else {
            return;
        };
        match event {
            WorkerEvent::Loaded {
                file_name,
                document,
            } => {
                let remote = document
                    .get(REMOTE_LOCATIONS_KEY)
                    .map(RemoteLocations::from_cache_value)
                    .unwrap_or_default();
                self.state.page = remote.len() / self.state.page_size.max(1) + 1;
                self.state.remote_locations = remote;
                info!(
                    %file_name,
                    remote = self.state.remote_locations.len(),
                    page = self.state.page,
                    "cache loaded"
                );
                self.observers.notify(&self.state);
            }
            other => self.log_event("cache", &other),
        }
    }

    /// Apply an event from the settings worker.
    pub fn handle_settings_event(&mut self, envelope: Envelope<WorkerEvent>) {
        let Some(event) = self.accept(envelope, "settings") else {
            return;
        };
        match event {
            WorkerEvent::Loaded {
                file_name,
                document,
            } => {
                let (mut settings, rejected) = SettingsPatch::from_document(&document);
                if !rejected.is_empty() {
                    warn!(%file_name, ?rejected, "settings file has malformed keys");
                }

                // A missing timestamp forces a sweep on the next remote update.
                if settings.maintenance_ts.is_none_or(|ts| ts == 0) {
                    settings.maintenance_ts = Some(
                        self.state
                            .settings
                            .maintenance_ts
                            .saturating_sub(self.config.maintenance_interval_ms()),
                    );
                }

                let offline = settings.offline.unwrap_or(self.state.settings.offline);
                let mut patch = StatePatch::settings(settings);
                if offline {
                    patch.title = Some(TITLE_OFFLINE.to_string());
                    patch.init = Some(false);
                }

                if self.migrated
                    && let Some(legacy) = self.legacy.as_mut()
                {
                    match legacy.clear() {
                        Ok(()) => {
                            self.migrated = false;
                            self.legacy = None;
                        }
                        Err(err) => warn!(%err, "legacy settings not cleared"),
                    }
                }

                info!(%file_name, keys = document.len(), offline, "settings loaded");
                self.set(patch);
            }
            other => self.log_event("settings", &other),
        }
    }

    /// Select the records in sector `sector_id`, searching the stored list
    /// when `stored` is set and the remote list otherwise.
    ///
    /// Returns `false` if no record lies in the sector.
    pub fn select_sector(&mut self, sector_id: &str, stored: bool) -> bool {
        let candidates: Vec<Location> = if stored {
            self.state
                .settings
                .stored_locations
                .iter()
                .cloned()
                .map(Location::from_stored)
                .collect()
        } else {
            self.state.remote_locations.results.clone()
        };

        match select_sector(&candidates, sector_id) {
            None => {
                debug!(sector_id, stored, "no records in sector");
                false
            }
            Some(Selection::Single(data)) => {
                self.set(StatePatch {
                    selected_location: Some(Some(data)),
                    ..StatePatch::default()
                });
                true
            }
            Some(Selection::Multiple { results, search }) => {
                let mut cache = RemoteLocations::from_results(results);
                cache.multiple_selected_locations = true;
                self.set(StatePatch {
                    search_cache: Some(cache),
                    search_in_progress: Some(true),
                    search: Some(search),
                    ..StatePatch::default()
                });
                true
            }
        }
    }

    /// Recompute the galaxy picker. On `init` the selected galaxy follows
    /// the player's current location.
    pub fn refresh_galaxy_options(&mut self, init: bool) {
        let state = &self.state;
        let options = galaxy_options(
            &state.settings.stored_locations,
            &state.remote_locations,
            state.selected_location.as_ref(),
            state.current_location.as_deref(),
        );
        let mut patch = StatePatch {
            galaxy_options: Some(options.options),
            ..StatePatch::default()
        };
        if init {
            patch.selected_galaxy = Some(options.current_galaxy);
        }
        self.set(patch);
    }

    /// Flip the legend flag `name` and persist it.
    ///
    /// Returns the new value, or `None` for an unknown legend name.
    pub fn toggle_show(&mut self, name: &str) -> Option<bool> {
        let mut show = self.state.settings.show;
        let visible = show.toggle(name)?;
        self.set(StatePatch::settings(SettingsPatch {
            show: Some(show),
            ..SettingsPatch::default()
        }));
        Some(visible)
    }

    /// The galaxy map series for the current state.
    #[must_use]
    pub fn map_series(&self) -> MapSeries {
        let state = &self.state;
        map_series(&MapInput {
            stored: &state.settings.stored_locations,
            remote: &state.remote_locations,
            selected: state.selected_location.as_ref(),
            current: state.current_location.as_deref(),
            favorites: &state.settings.favorites,
            selected_galaxy: state.selected_galaxy,
            show: &state.settings.show,
        })
    }

    /// Ask both workers to write pending changes and stop.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Worker`] if a worker has already stopped.
    pub fn shutdown(&self) -> Result<(), StateError> {
        self.cache.shutdown()?;
        self.settings.shutdown()?;
        Ok(())
    }

    /// Dispatch worker events until both channels close.
    pub async fn run(&mut self, mut cache_events: WorkerEvents, mut settings_events: WorkerEvents) {
        let mut cache_open = true;
        let mut settings_open = true;

        loop {
            tokio::select! {
                event = cache_events.recv(), if cache_open => match event {
                    Some(envelope) => self.handle_cache_event(envelope),
                    None => cache_open = false,
                },
                event = settings_events.recv(), if settings_open => match event {
                    Some(envelope) => self.handle_settings_event(envelope),
                    None => settings_open = false,
                },
                else => break,
            }
        }

        debug!("worker event channels closed");
    }

    fn accept(&self, envelope: Envelope<WorkerEvent>, worker: &str) -> Option<WorkerEvent> {
        if envelope.is_current() {
            Some(envelope.body)
        } else {
            warn!(worker, version = envelope.version, "ignoring event from another protocol version");
            None
        }
    }

    fn log_event(&self, worker: &str, event: &WorkerEvent) {
        match event {
            WorkerEvent::Loaded { .. } => {}
            WorkerEvent::Persisted { file_name, keys } => {
                debug!(worker, %file_name, ?keys, "persisted");
            }
            WorkerEvent::Failed { message } => warn!(worker, %message, "worker failed"),
            WorkerEvent::Rejected { expected, got } => {
                warn!(worker, expected, got, "worker rejected a command");
            }
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("observers", &self.observers)
            .field("migrated", &self.migrated)
            .finish_non_exhaustive()
    }
}
