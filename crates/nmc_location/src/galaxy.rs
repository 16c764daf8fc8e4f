//! Galaxy names and the galaxy picker options.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::location::{LocationData, RemoteLocations};

/// Names of the first galaxies, indexed by galaxy id.
pub const KNOWN_GALAXIES: &[&str] = &[
    "Euclid",
    "Hilbert Dimension",
    "Calypso",
    "Hesperius Dimension",
    "Hyades",
    "Ickjamatew",
    "Budullangr",
    "Kikolgallr",
    "Eltiensleen",
    "Eissentam",
    "Elkupalos",
    "Aptarkaba",
    "Ontiniangp",
    "Odiwagiri",
    "Ogtialabi",
    "Muhacksonto",
    "Hitonskyer",
    "Rerasmutul",
    "Isdoraijung",
    "Doctinawyra",
];

/// Display name of a galaxy, falling back to `"Galaxy N"` (1-based) for ids
/// outside [`KNOWN_GALAXIES`].
#[must_use]
pub fn galaxy_name(id: u32) -> String {
    KNOWN_GALAXIES
        .get(id as usize)
        .map_or_else(|| format!("Galaxy {}", u64::from(id) + 1), |name| (*name).to_string())
}

/// One entry in the galaxy picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalaxyOption {
    pub id: u32,
    pub label: String,
}

/// The result of [`galaxy_options`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalaxyOptions {
    /// Unique galaxies in ascending id order.
    pub options: Vec<GalaxyOption>,
    /// Galaxy of the player's current location, `0` if unknown.
    pub current_galaxy: u32,
}

/// Collect the galaxies that appear in any known record.
///
/// Every stored record contributes its galaxy. Remote and selected records
/// contribute only a non-zero galaxy, since the database omits the field for
/// the starting galaxy. `current` is the id of the stored record the player
/// is at.
#[must_use]
pub fn galaxy_options(
    stored: &[LocationData],
    remote: &RemoteLocations,
    selected: Option<&LocationData>,
    current: Option<&str>,
) -> GalaxyOptions {
    let mut ids = BTreeSet::new();
    let mut current_galaxy = 0;

    for location in stored {
        if current == Some(location.id.as_str()) && location.galaxy != 0 {
            current_galaxy = location.galaxy;
        }
        ids.insert(location.galaxy);
    }
    ids.extend(
        remote
            .results
            .iter()
            .map(|l| l.data.galaxy)
            .filter(|&g| g != 0),
    );
    if let Some(selected) = selected.filter(|s| s.galaxy != 0) {
        ids.insert(selected.galaxy);
    }

    GalaxyOptions {
        options: ids
            .into_iter()
            .map(|id| GalaxyOption {
                id,
                label: galaxy_name(id),
            })
            .collect(),
        current_galaxy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;

    fn data(id: &str, galaxy: u32) -> LocationData {
        LocationData {
            id: id.to_string(),
            galaxy,
            ..LocationData::default()
        }
    }

    #[test]
    fn test_galaxy_name_fallback() {
        assert_eq!(galaxy_name(0), "Euclid");
        assert_eq!(galaxy_name(2), "Calypso");
        assert_eq!(galaxy_name(254), "Galaxy 255");
    }

    #[test]
    fn test_options_unique_and_sorted() {
        let stored = vec![data("a", 3), data("b", 0), data("c", 3)];
        let remote = RemoteLocations::from_results(vec![
            Location {
                data: data("r1", 9),
                ..Location::default()
            },
            Location {
                data: data("r2", 0),
                ..Location::default()
            },
        ]);
        let selected = data("s", 1);
        let result = galaxy_options(&stored, &remote, Some(&selected), None);
        let ids: Vec<_> = result.options.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![0, 1, 3, 9]);
        assert_eq!(result.options[1].label, "Hilbert Dimension");
    }

    #[test]
    fn test_current_galaxy_from_stored_record() {
        let stored = vec![data("a", 0), data("here", 4)];
        let result = galaxy_options(&stored, &RemoteLocations::default(), None, Some("here"));
        assert_eq!(result.current_galaxy, 4);
    }

    #[test]
    fn test_no_records_no_options() {
        let result = galaxy_options(&[], &RemoteLocations::default(), None, None);
        assert!(result.options.is_empty());
        assert_eq!(result.current_galaxy, 0);
    }
}
