//! Command implementations. Each one runs against a loaded [`Store`].

use std::path::Path;

use anyhow::{Context, Result, bail};
use nmc_location::{
    Location, LocationEntry, MapSeries, RemoteLocations, ShowFlags, StarSystem, galaxy_name,
    group_remote, group_systems, sector_key,
};
use nmc_state::{SETTINGS_KEYS, SettingsPatch, StatePatch, Store, is_settings_key};
use nmc_worker::Document;
use serde_json::Value;
use tracing::info;

pub fn systems(store: &Store, stored: bool) -> Result<()> {
    let state = store.get();
    let systems = if stored {
        let locations: Vec<Location> = state
            .settings
            .stored_locations
            .iter()
            .cloned()
            .map(Location::from_stored)
            .collect();
        group_systems(&locations)
    } else {
        group_remote(&state.remote_locations).1
    };

    for system in &systems {
        println!("{}", format_system(system));
    }
    println!("{} systems", systems.len());
    Ok(())
}

pub fn import(store: &mut Store, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let mut results = parse_import(&text).with_context(|| format!("parsing {}", file.display()))?;
    let imported = results.len();
    info!(imported, file = %file.display(), "importing locations");

    // Newer records first, as a fresh remote fetch would deliver them.
    results.extend(store.get().remote_locations.results.iter().cloned());
    let page = RemoteLocations::from_results(results);

    // The cache is only written once a page is already held in memory.
    if store.get().remote_locations.is_empty() {
        store.set(StatePatch {
            remote_locations: Some(page.clone()),
            ..StatePatch::default()
        });
    }
    store.set(StatePatch {
        remote_locations: Some(page),
        ..StatePatch::default()
    });

    println!(
        "imported {imported} locations, {} cached",
        store.get().remote_locations.len()
    );
    Ok(())
}

pub fn settings(store: &Store) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&store.get().settings)?);
    Ok(())
}

pub fn set(store: &mut Store, key: &str, raw: &str) -> Result<()> {
    let patch = parse_setting(key, raw)?;
    store.set(StatePatch::settings(patch));
    println!("{key} = {raw}");
    Ok(())
}

pub fn map(store: &mut Store, galaxy: Option<u32>) -> Result<()> {
    store.refresh_galaxy_options(true);
    if let Some(galaxy) = galaxy {
        store.set(StatePatch {
            selected_galaxy: Some(galaxy),
            ..StatePatch::default()
        });
    }

    let state = store.get();
    let known: Vec<&str> = state.galaxy_options.iter().map(|o| o.label.as_str()).collect();
    println!("galaxy: {}", galaxy_name(state.selected_galaxy));
    println!("known galaxies: {}", known.join(", "));
    for (name, count) in series_counts(&store.map_series()) {
        println!("{name:<9} {count}");
    }
    Ok(())
}

pub fn toggle(store: &mut Store, name: &str) -> Result<()> {
    let Some(visible) = store.toggle_show(name) else {
        bail!(
            "unknown legend entry {name:?}, expected one of: {}",
            ShowFlags::NAMES.join(", ")
        );
    };
    println!("{name}: {}", if visible { "shown" } else { "hidden" });
    Ok(())
}

/// Parse an import file: a JSON array of locations in either shape, or a
/// remote page object.
fn parse_import(text: &str) -> Result<Vec<Location>> {
    let value: Value = serde_json::from_str(text).context("not valid JSON")?;
    match value {
        Value::Array(_) => {
            let entries: Vec<LocationEntry> =
                serde_json::from_value(value).context("not an array of locations")?;
            Ok(entries.into_iter().map(LocationEntry::into_location).collect())
        }
        Value::Object(_) => {
            let page: RemoteLocations =
                serde_json::from_value(value).context("not a remote location page")?;
            Ok(page.results)
        }
        _ => bail!("expected an array of locations or a page object"),
    }
}

/// Build a one-key settings patch from a command-line value.
fn parse_setting(key: &str, raw: &str) -> Result<SettingsPatch> {
    if !is_settings_key(key) {
        bail!(
            "unknown setting {key:?}, expected one of: {}",
            SETTINGS_KEYS.join(", ")
        );
    }
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("value for {key} is not JSON"))?;

    let mut document = Document::new();
    document.insert(key.to_string(), value);
    let patch: SettingsPatch = serde_json::from_value(Value::Object(document))
        .with_context(|| format!("{raw} is not a valid value for {key}"))?;
    if patch.is_empty() {
        bail!("{key} cannot be cleared");
    }
    Ok(patch)
}

fn format_system(system: &StarSystem) -> String {
    let data = &system.location.data;
    let mut lines = vec![format!(
        "{}  {}  {}",
        sector_key(data).unwrap_or_default(),
        galaxy_name(data.galaxy),
        data.label()
    )];
    lines.extend(
        system
            .planet_data
            .iter()
            .map(|d| format!("    {}: {}", d.username, d.entries.join(", "))),
    );
    lines.join("\n")
}

fn series_counts(series: &MapSeries) -> [(&'static str, usize); 8] {
    [
        ("Shared", series.shared.len()),
        ("PS4", series.ps4.len()),
        ("Explored", series.explored.len()),
        ("Center", series.center.len()),
        ("Base", series.base.len()),
        ("Favorite", series.favorite.len()),
        ("Current", series.current.len()),
        ("Selected", series.selected.len()),
    ]
}
