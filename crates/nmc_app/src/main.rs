//! # nmc: galaxy companion store
//!
//! Opens the remote location cache and the settings bag in the config
//! directory, runs one command against the store, then flushes both files.
//!
//! ## Startup Sequence
//!
//! 1. Resolve the config directory (`--config-dir`, then `NMC_CONFIG_DIR`,
//!    then `~/.nmc`).
//! 2. Spawn the cache and settings workers and wait for both documents.
//! 3. Run the command, then shut the workers down and drain their events.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use nmc_state::{JsonFileLegacy, Store, StoreConfig};
use nmc_worker::{Envelope, JsonStoreWorker, WorkerConfig, WorkerEvent, WorkerEvents};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nmc", about = "Location cache and settings store for the galaxy companion")]
struct Args {
    /// Directory holding cache.json and settings.json
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Home directory searched for the game's save directory
    #[arg(long)]
    home_dir: Option<PathBuf>,

    /// Flat JSON file with settings from an older release
    #[arg(long)]
    legacy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the star systems of the cached or stored locations
    Systems {
        /// Group the locally stored locations instead of the remote cache
        #[arg(long)]
        stored: bool,
    },
    /// Merge remote locations from a JSON file into the cache
    Import {
        /// A JSON array of locations or a remote page object
        file: PathBuf,
    },
    /// Print the persisted settings
    Settings,
    /// Persist one setting
    Set {
        /// Setting key, e.g. `pollRate`
        key: String,
        /// JSON value, e.g. `30000` or `"creative"`
        value: String,
    },
    /// Summarise the galaxy map series
    Map {
        /// Galaxy to show; defaults to the galaxy of the current location
        #[arg(short, long)]
        galaxy: Option<u32>,
    },
    /// Flip the visibility of one map legend entry
    Toggle {
        /// Legend name, e.g. `Explored`
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = match args.config_dir {
        Some(dir) => StoreConfig::new(dir),
        None => StoreConfig::from_env(),
    };
    if let Some(home) = args.home_dir {
        config = config.with_home_dir(home);
    }
    info!(config_dir = %config.config_dir.display(), "opening store");

    let (cache, mut cache_events) =
        JsonStoreWorker::spawn(WorkerConfig::new("cache").with_discard_corrupt(true));
    let (settings, mut settings_events) = JsonStoreWorker::spawn(WorkerConfig::new("settings"));

    let mut store = Store::new(config, cache, settings);
    if let Some(path) = args.legacy {
        let legacy = JsonFileLegacy::load(&path)
            .with_context(|| format!("reading legacy settings {}", path.display()))?;
        if let Some(legacy) = legacy {
            store = store.with_legacy(legacy);
        }
    }
    store.init()?;

    // The cache can be refetched, so losing it is not fatal.
    match next_loaded(&mut cache_events, "cache").await {
        Ok(loaded) => store.handle_cache_event(loaded),
        Err(err) => warn!(%err, "continuing with an empty location cache"),
    }
    let loaded = next_loaded(&mut settings_events, "settings").await?;
    store.handle_settings_event(loaded);

    let outcome = match args.command {
        Command::Systems { stored } => commands::systems(&store, stored),
        Command::Import { file } => commands::import(&mut store, &file),
        Command::Settings => commands::settings(&store),
        Command::Set { key, value } => commands::set(&mut store, &key, &value),
        Command::Map { galaxy } => commands::map(&mut store, galaxy),
        Command::Toggle { name } => commands::toggle(&mut store, &name),
    };

    // Persist whatever the command changed, even if it failed part way.
    store.shutdown()?;
    store.run(cache_events, settings_events).await;
    info!("store closed");

    outcome
}

/// Wait for the `Loaded` event of a freshly opened worker.
async fn next_loaded(events: &mut WorkerEvents, worker: &str) -> Result<Envelope<WorkerEvent>> {
    while let Some(envelope) = events.recv().await {
        if matches!(envelope.body, WorkerEvent::Loaded { .. }) {
            return Ok(envelope);
        }
        match envelope.body {
            WorkerEvent::Failed { message } => bail!("{worker} worker failed: {message}"),
            WorkerEvent::Rejected { expected, got } => {
                bail!("{worker} worker speaks protocol {expected}, store sent {got}")
            }
            WorkerEvent::Loaded { .. } | WorkerEvent::Persisted { .. } => {}
        }
    }
    bail!("{worker} worker stopped before loading")
}

#[cfg(test)]
mod tests {
    use nmc_worker::Document;
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn test_next_loaded_skips_persisted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Envelope::new(WorkerEvent::Persisted {
            file_name: "cache.json".to_string(),
            keys: vec![],
        }))
        .unwrap();
        tx.send(Envelope::new(WorkerEvent::Loaded {
            file_name: "cache.json".to_string(),
            document: Document::new(),
        }))
        .unwrap();
        let loaded = next_loaded(&mut rx, "cache").await.unwrap();
        assert!(matches!(loaded.body, WorkerEvent::Loaded { .. }));
    }

    #[tokio::test]
    async fn test_next_loaded_fails_on_worker_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Envelope::new(WorkerEvent::Failed {
            message: "not a JSON object".to_string(),
        }))
        .unwrap();
        let err = next_loaded(&mut rx, "settings").await.unwrap_err();
        assert!(err.to_string().contains("settings worker failed"));

        drop(tx);
        assert!(next_loaded(&mut rx, "settings").await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_cache_opens_empty() {
        let dir = std::env::temp_dir().join(format!("nmc-app-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cache.json"), b"[]").unwrap();

        let (cache, mut cache_events) =
            JsonStoreWorker::spawn(WorkerConfig::new("cache").with_discard_corrupt(true));
        let (settings, _settings_events) = JsonStoreWorker::spawn(WorkerConfig::new("settings"));
        let mut store = Store::new(StoreConfig::new(&dir), cache, settings);
        store.init().unwrap();

        let loaded = next_loaded(&mut cache_events, "cache").await.unwrap();
        store.handle_cache_event(loaded);
        assert!(store.get().remote_locations.is_empty());
        assert!(dir.join("cache.json.corrupt").exists());

        let _ = std::fs::remove_dir_all(dir);
    }
}
