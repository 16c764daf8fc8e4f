//! Coordinate types.
//!
//! Translated coordinates place a system on the galaxy map (`0..=4096` on
//! each horizontal axis). Voxel coordinates are the raw offsets stored in the
//! save file and bound the set of reachable systems.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::location::LocationData;

/// A translated coordinate triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coords {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the exact-equality grouping key for this triple.
    #[must_use]
    pub fn key(self) -> CoordKey {
        CoordKey::from(self)
    }

    #[must_use]
    pub fn to_dvec3(self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

/// A hashable key with the same equality as comparing each axis with `==`.
///
/// Built from the IEEE-754 bit patterns. `-0.0` is folded into `0.0` so the
/// two compare equal as they do under `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey([u64; 3]);

impl From<Coords> for CoordKey {
    fn from(coords: Coords) -> Self {
        fn bits(v: f64) -> u64 {
            if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
        }
        Self([bits(coords.x), bits(coords.y), bits(coords.z)])
    }
}

/// Exclusive bounds of valid voxel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelBounds {
    /// Half-width of the horizontal axes: `X` and `Z` lie strictly inside
    /// `(-XZ, XZ - 1)`.
    pub xz: i64,
    /// Half-height of the vertical axis: `Y` lies strictly inside
    /// `(-Y, Y - 1)`.
    pub y: i64,
}

impl VoxelBounds {
    /// The bounds of the game's galaxy grid.
    pub const GALAXY: Self = Self { xz: 2048, y: 128 };

    /// Returns `true` if every voxel axis of `data` is present and strictly
    /// inside the bounds.
    #[must_use]
    pub fn contains(&self, data: &LocationData) -> bool {
        let inside = |v: Option<i64>, half: i64| v.is_some_and(|v| v > -half && v < half - 1);
        inside(data.voxel_x, self.xz) && inside(data.voxel_y, self.y) && inside(data.voxel_z, self.xz)
    }
}

impl Default for VoxelBounds {
    fn default() -> Self {
        Self::GALAXY
    }
}

/// The map's sector key for a record, `"Z:Y:X"` over translated coordinates.
///
/// Returns `None` if any axis is missing.
#[must_use]
pub fn sector_key(data: &LocationData) -> Option<String> {
    let c = data.coords()?;
    Some(format!("{}:{}:{}", c.z, c.y, c.x))
}

/// The portal address of a record without its trailing planet segment.
#[must_use]
pub fn sector_address(data: &LocationData) -> Option<String> {
    let id = data.translated_id.as_deref()?;
    let (head, _) = id.rsplit_once(':')?;
    Some(head.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_voxels(x: i64, y: i64, z: i64) -> LocationData {
        LocationData {
            voxel_x: Some(x),
            voxel_y: Some(y),
            voxel_z: Some(z),
            ..LocationData::default()
        }
    }

    #[test]
    fn test_key_matches_float_equality() {
        assert_eq!(
            Coords::new(1.5, 2.0, 3.0).key(),
            Coords::new(1.5, 2.0, 3.0).key()
        );
        assert_ne!(
            Coords::new(1.5, 2.0, 3.0).key(),
            Coords::new(1.5, 2.0, 3.000_000_1).key()
        );
        assert_eq!(
            Coords::new(-0.0, 0.0, 0.0).key(),
            Coords::new(0.0, 0.0, 0.0).key()
        );
    }

    #[test]
    fn test_voxel_bounds_are_exclusive() {
        let bounds = VoxelBounds::GALAXY;
        assert!(bounds.contains(&with_voxels(0, 0, 0)));
        assert!(bounds.contains(&with_voxels(-2047, -127, 2045)));
        assert!(!bounds.contains(&with_voxels(-2048, 0, 0)));
        assert!(!bounds.contains(&with_voxels(0, 127, 0)));
        assert!(!bounds.contains(&with_voxels(0, 0, 2047)));
    }

    #[test]
    fn test_missing_voxel_is_out_of_bounds() {
        let data = LocationData {
            voxel_x: Some(1),
            voxel_y: Some(1),
            ..LocationData::default()
        };
        assert!(!VoxelBounds::GALAXY.contains(&data));
    }

    #[test]
    fn test_sector_key_order_is_zyx() {
        let data = LocationData {
            translated_x: Some(10.0),
            translated_y: Some(20.0),
            translated_z: Some(30.0),
            ..LocationData::default()
        };
        assert_eq!(sector_key(&data).as_deref(), Some("30:20:10"));
    }

    #[test]
    fn test_sector_address_drops_planet_segment() {
        let data = LocationData {
            translated_id: Some("0469:0081:0D6D:0211".to_string()),
            ..LocationData::default()
        };
        assert_eq!(sector_address(&data).as_deref(), Some("0469:0081:0D6D"));
    }
}
