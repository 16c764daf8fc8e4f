//! Galaxy map series.
//!
//! The map plots one scatter series per legend entry. This module turns the
//! store's location lists into those series; drawing them is left to the
//! front end.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::coords::sector_key;
use crate::location::{Location, LocationData, RemoteLocations};
use crate::system::{Discoverer, group_systems};

/// Width of the map's horizontal axes.
pub const MAP_EXTENT: f64 = 4096.0;

/// The galactic centre in map coordinates.
pub const CENTER: MapPoint = MapPoint {
    x: 2047.0,
    y: 2047.0,
    z: 127.0,
    id: String::new(),
    user: None,
    planet_data: Vec::new(),
    stored: false,
};

/// Per-series visibility, keyed by legend name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ShowFlags {
    pub shared: bool,
    #[serde(rename = "PS4")]
    pub ps4: bool,
    pub explored: bool,
    pub center: bool,
    pub favorite: bool,
    pub current: bool,
    pub selected: bool,
    pub base: bool,
}

impl ShowFlags {
    /// Legend names in drawing order.
    pub const NAMES: [&'static str; 8] = [
        "Shared", "PS4", "Explored", "Center", "Base", "Favorite", "Current", "Selected",
    ];

    fn flag_mut(&mut self, name: &str) -> Option<&mut bool> {
        Some(match name {
            "Shared" => &mut self.shared,
            "PS4" => &mut self.ps4,
            "Explored" => &mut self.explored,
            "Center" => &mut self.center,
            "Favorite" => &mut self.favorite,
            "Current" => &mut self.current,
            "Selected" => &mut self.selected,
            "Base" => &mut self.base,
            _ => return None,
        })
    }

    /// Flip the flag for legend entry `name`.
    ///
    /// Returns the new value, or `None` for an unknown name.
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let flag = self.flag_mut(name)?;
        *flag = !*flag;
        Some(*flag)
    }
}

impl Default for ShowFlags {
    fn default() -> Self {
        Self {
            shared: true,
            ps4: true,
            explored: true,
            center: true,
            favorite: true,
            current: true,
            selected: true,
            base: true,
        }
    }
}

/// One plotted point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPoint {
    pub x: f64,
    /// Inverted translated `Z`, so north is up.
    pub y: f64,
    /// Translated `Y`, drawn as point size.
    pub z: f64,
    /// Sector key of the point, used to resolve clicks.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planet_data: Vec<Discoverer>,
    /// The point comes from the local save rather than the database.
    pub stored: bool,
}

impl MapPoint {
    fn from_data(data: &LocationData, stored: bool) -> Option<Self> {
        let c = data.coords()?;
        Some(Self {
            x: c.x,
            y: MAP_EXTENT - c.z,
            z: c.y,
            id: sector_key(data)?,
            user: (!data.username.is_empty()).then(|| data.username.clone()),
            planet_data: Vec::new(),
            stored,
        })
    }
}

/// Everything the map needs from the store.
#[derive(Debug, Clone, Copy)]
pub struct MapInput<'a> {
    pub stored: &'a [LocationData],
    pub remote: &'a RemoteLocations,
    pub selected: Option<&'a LocationData>,
    /// Id of the stored record the player is currently at.
    pub current: Option<&'a str>,
    /// Ids of favourited remote records.
    pub favorites: &'a [String],
    pub selected_galaxy: u32,
    pub show: &'a ShowFlags,
}

/// Points per legend series. Hidden series are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSeries {
    pub shared: Vec<MapPoint>,
    pub ps4: Vec<MapPoint>,
    pub explored: Vec<MapPoint>,
    pub center: Vec<MapPoint>,
    pub base: Vec<MapPoint>,
    pub favorite: Vec<MapPoint>,
    pub current: Vec<MapPoint>,
    pub selected: Vec<MapPoint>,
}

impl MapSeries {
    /// Total number of points across all series.
    #[must_use]
    pub fn len(&self) -> usize {
        [
            &self.shared,
            &self.ps4,
            &self.explored,
            &self.center,
            &self.base,
            &self.favorite,
            &self.current,
            &self.selected,
        ]
        .iter()
        .map(|s| s.len())
        .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the map series for the selected galaxy.
#[must_use]
pub fn map_series(input: &MapInput<'_>) -> MapSeries {
    let show = input.show;
    let galaxy = input.selected_galaxy;
    let mut series = MapSeries::default();

    let stored: Vec<Location> = input
        .stored
        .iter()
        .filter(|d| d.galaxy == galaxy)
        .cloned()
        .map(Location::from_stored)
        .collect();
    let remote: Vec<Location> = input
        .remote
        .results
        .iter()
        .filter(|l| l.data.galaxy == galaxy)
        .cloned()
        .collect();

    for system in group_systems(&remote) {
        let data = &system.location.data;
        let Some(mut point) = MapPoint::from_data(data, false) else {
            continue;
        };
        point.planet_data = system.planet_data.clone();
        if data.base {
            if show.base {
                series.base.push(point.clone());
            }
        } else if data.ps4 {
            if show.ps4 {
                series.ps4.push(point.clone());
            }
        } else if show.shared {
            series.shared.push(point.clone());
        }
        if show.favorite && input.favorites.iter().any(|f| *f == data.id) {
            series.favorite.push(point);
        }
    }

    for system in group_systems(&stored) {
        let data = &system.location.data;
        let Some(mut point) = MapPoint::from_data(data, true) else {
            continue;
        };
        point.planet_data = system.planet_data.clone();
        if data.base {
            if show.base {
                series.base.push(point);
            }
        } else if show.explored {
            series.explored.push(point);
        }
    }

    if show.current
        && let Some(current) = input.current
        && let Some(data) = input
            .stored
            .iter()
            .find(|d| d.id == current && d.galaxy == galaxy)
        && let Some(point) = MapPoint::from_data(data, true)
    {
        series.current.push(point);
    }

    if show.selected
        && let Some(data) = input.selected.filter(|d| d.galaxy == galaxy)
        && let Some(point) = MapPoint::from_data(data, false)
    {
        series.selected.push(point);
    }

    if show.center {
        series.center.push(CENTER);
    }

    series
}

/// Sort by Euclidean distance of translated coordinates from `origin`,
/// nearest first. Records without coordinates sort last. The sort is stable.
pub fn sort_by_distance(locations: &mut [Location], origin: DVec3) {
    locations.sort_by(|a, b| {
        let da = a.data.coords().map(|c| c.to_dvec3().distance_squared(origin));
        let db = b.data.coords().map(|c| c.to_dvec3().distance_squared(origin));
        match (da, db) {
            (Some(da), Some(db)) => da.total_cmp(&db),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(id: &str, xyz: (f64, f64, f64)) -> LocationData {
        LocationData {
            id: id.to_string(),
            username: "Nova".to_string(),
            translated_x: Some(xyz.0),
            translated_y: Some(xyz.1),
            translated_z: Some(xyz.2),
            ..LocationData::default()
        }
    }

    fn input<'a>(
        stored: &'a [LocationData],
        remote: &'a RemoteLocations,
        show: &'a ShowFlags,
    ) -> MapInput<'a> {
        MapInput {
            stored,
            remote,
            selected: None,
            current: None,
            favorites: &[],
            selected_galaxy: 0,
            show,
        }
    }

    #[test]
    fn test_toggle_known_and_unknown() {
        let mut show = ShowFlags::default();
        assert_eq!(show.toggle("PS4"), Some(false));
        assert!(!show.ps4);
        assert_eq!(show.toggle("PS4"), Some(true));
        assert_eq!(show.toggle("Nope"), None);
    }

    #[test]
    fn test_show_flags_use_legend_names() {
        let value = serde_json::to_value(ShowFlags::default()).unwrap();
        for name in ShowFlags::NAMES {
            assert_eq!(value[name], serde_json::Value::Bool(true), "{name}");
        }
    }

    #[test]
    fn test_point_inverts_z() {
        let point = MapPoint::from_data(&data("a", (100.0, 10.0, 1000.0)), true).unwrap();
        assert_eq!(point.x, 100.0);
        assert_eq!(point.y, MAP_EXTENT - 1000.0);
        assert_eq!(point.z, 10.0);
        assert_eq!(point.id, "1000:10:100");
    }

    #[test]
    fn test_series_classification() {
        let stored = vec![data("s1", (1.0, 1.0, 1.0)), data("s2", (1.0, 1.0, 1.0))];
        let mut console = data("r2", (3.0, 3.0, 3.0));
        console.ps4 = true;
        let remote = RemoteLocations::from_results(vec![
            Location::from_stored(data("r1", (2.0, 2.0, 2.0))),
            Location::from_stored(console),
        ]);
        let show = ShowFlags::default();
        let series = map_series(&input(&stored, &remote, &show));
        assert_eq!(series.explored.len(), 1);
        assert_eq!(series.shared.len(), 1);
        assert_eq!(series.ps4.len(), 1);
        assert_eq!(series.center, vec![CENTER]);
    }

    #[test]
    fn test_hidden_series_empty() {
        let stored = vec![data("s1", (1.0, 1.0, 1.0))];
        let remote = RemoteLocations::default();
        let show = ShowFlags {
            explored: false,
            center: false,
            ..ShowFlags::default()
        };
        assert!(map_series(&input(&stored, &remote, &show)).is_empty());
    }

    #[test]
    fn test_other_galaxy_excluded() {
        let mut far = data("s1", (1.0, 1.0, 1.0));
        far.galaxy = 3;
        let stored = vec![far];
        let remote = RemoteLocations::default();
        let show = ShowFlags::default();
        let series = map_series(&input(&stored, &remote, &show));
        assert!(series.explored.is_empty());
    }

    #[test]
    fn test_current_favorite_and_selected() {
        let stored = vec![data("here", (5.0, 5.0, 5.0))];
        let remote = RemoteLocations::from_results(vec![Location::from_stored(data(
            "fav",
            (6.0, 6.0, 6.0),
        ))]);
        let favorites = vec!["fav".to_string()];
        let selected = data("sel", (7.0, 7.0, 7.0));
        let show = ShowFlags::default();
        let series = map_series(&MapInput {
            selected: Some(&selected),
            current: Some("here"),
            favorites: &favorites,
            ..input(&stored, &remote, &show)
        });
        assert_eq!(series.current.len(), 1);
        assert_eq!(series.favorite.len(), 1);
        assert_eq!(series.selected[0].id, "7:7:7");
    }

    #[test]
    fn test_sort_by_distance() {
        let mut records = vec![
            Location::from_stored(data("far", (100.0, 0.0, 0.0))),
            Location::from_stored(LocationData::default()),
            Location::from_stored(data("near", (1.0, 0.0, 0.0))),
        ];
        sort_by_distance(&mut records, DVec3::ZERO);
        let ids: Vec<_> = records.iter().map(|l| l.data.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far", ""]);
    }
}
