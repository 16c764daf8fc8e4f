//! The maintenance sweep over the remote location cache.
//!
//! Shared records occasionally carry voxel coordinates outside the galaxy
//! grid, and paging through the database can deliver the same record twice.
//! The sweep removes both before the cache is persisted.

use std::collections::HashSet;

use tracing::debug;

use crate::coords::VoxelBounds;
use crate::location::{Location, RemoteLocations};

/// Keep only records whose voxel coordinates lie inside `bounds`.
#[must_use]
pub fn filter_valid_voxels(locations: Vec<Location>, bounds: VoxelBounds) -> Vec<Location> {
    locations
        .into_iter()
        .filter(|location| bounds.contains(&location.data))
        .collect()
}

/// Keep the first record for each `data.id`.
#[must_use]
pub fn dedupe_by_id(locations: Vec<Location>) -> Vec<Location> {
    let mut seen = HashSet::new();
    locations
        .into_iter()
        .filter(|location| seen.insert(location.data.id.clone()))
        .collect()
}

/// Filter and deduplicate `page` in place, then set `count` to the new length.
///
/// Returns the number of records removed.
pub fn run_maintenance(page: &mut RemoteLocations, bounds: VoxelBounds) -> usize {
    let before = page.results.len();
    let results = std::mem::take(&mut page.results);
    page.results = dedupe_by_id(filter_valid_voxels(results, bounds));
    page.count = page.results.len();

    let removed = before - page.count;
    debug!(before, after = page.count, removed, "maintenance sweep");
    removed
}
