//! # nmc_location
//!
//! Location records and the map-side reconciliation logic for the galaxy
//! companion.
//!
//! This crate provides:
//!
//! - [`location`]: stored and remote record shapes, the paginated remote list.
//! - [`coords`]: translated coordinates, exact-equality keys, voxel bounds.
//! - [`system`]: grouping records into star systems with per-user labels.
//! - [`maintenance`]: the filter-and-dedupe sweep over the remote cache.
//! - [`galaxy`]: galaxy names and picker options.
//! - [`select`]: resolving a clicked sector back to records.
//! - [`map`]: legend series for the galaxy map.

pub mod coords;
pub mod galaxy;
pub mod location;
pub mod maintenance;
pub mod map;
pub mod select;
pub mod system;

pub use coords::{CoordKey, Coords, VoxelBounds, sector_address, sector_key};
pub use galaxy::{GalaxyOption, GalaxyOptions, galaxy_name, galaxy_options};
pub use location::{Location, LocationData, LocationEntry, RemoteLocations, parse_records};
pub use maintenance::{dedupe_by_id, filter_valid_voxels, run_maintenance};
pub use map::{MapInput, MapPoint, MapSeries, ShowFlags, map_series, sort_by_distance};
pub use select::{Selection, select_sector};
pub use system::{Discoverer, StarSystem, group_remote, group_systems};
