//! Grouping of location records into star systems.
//!
//! Several records can share a translated coordinate triple: different
//! planets of the same system, or the same system discovered by several users.
//! The map shows one point per triple, annotated with who discovered it and
//! which labels they attached.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::coords::CoordKey;
use crate::location::{Location, RemoteLocations};

/// One discovering user of a system and the labels they attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discoverer {
    pub username: String,
    /// Distinct labels in first-seen order.
    pub entries: Vec<String>,
}

/// All records sharing one coordinate triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarSystem {
    /// The first record seen at this triple. Represents the system on the map.
    pub location: Location,
    /// Discoverers in first-seen order.
    pub planet_data: Vec<Discoverer>,
}

impl StarSystem {
    fn new(location: Location) -> Self {
        Self {
            location,
            planet_data: Vec::new(),
        }
    }

    fn record(&mut self, location: &Location) {
        let data = &location.data;
        let label = data.label();
        match self
            .planet_data
            .iter_mut()
            .find(|d| d.username == data.username)
        {
            Some(discoverer) => {
                if !discoverer.entries.iter().any(|e| e == label) {
                    discoverer.entries.push(label.to_string());
                }
            }
            None => self.planet_data.push(Discoverer {
                username: data.username.clone(),
                entries: vec![label.to_string()],
            }),
        }
    }

    /// Total number of distinct labels across all discoverers.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.planet_data.iter().map(|d| d.entries.len()).sum()
    }
}

/// Group records by exact translated coordinate equality.
///
/// Systems appear in the order their first record appears in `locations`.
/// Records without a complete coordinate triple are skipped.
#[must_use]
pub fn group_systems(locations: &[Location]) -> Vec<StarSystem> {
    let mut index: HashMap<CoordKey, usize> = HashMap::new();
    let mut systems: Vec<StarSystem> = Vec::new();

    for location in locations {
        let Some(coords) = location.data.coords() else {
            continue;
        };
        let slot = *index.entry(coords.key()).or_insert_with(|| {
            systems.push(StarSystem::new(location.clone()));
            systems.len() - 1
        });
        systems[slot].record(location);
    }

    tracing::trace!(
        records = locations.len(),
        systems = systems.len(),
        "grouped locations"
    );
    systems
}

/// Group a remote page, keeping its pagination fields.
///
/// The returned page's `results` hold one representative record per system;
/// the per-system annotations are returned alongside, parallel with
/// `results`.
#[must_use]
pub fn group_remote(page: &RemoteLocations) -> (RemoteLocations, Vec<StarSystem>) {
    let systems = group_systems(&page.results);
    let grouped = RemoteLocations {
        results: systems.iter().map(|s| s.location.clone()).collect(),
        count: page.count,
        next: page.next.clone(),
        prev: page.prev.clone(),
        multiple_selected_locations: page.multiple_selected_locations,
    };
    (grouped, systems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationData;

    fn loc(id: &str, user: &str, name: Option<&str>, xyz: (f64, f64, f64)) -> Location {
        Location {
            id: format!("share-{id}"),
            data: LocationData {
                id: id.to_string(),
                username: user.to_string(),
                name: name.map(str::to_string),
                translated_x: Some(xyz.0),
                translated_y: Some(xyz.1),
                translated_z: Some(xyz.2),
                ..LocationData::default()
            },
            ..Location::default()
        }
    }

    #[test]
    fn test_empty_input_no_systems() {
        assert!(group_systems(&[]).is_empty());
    }

    #[test]
    fn test_shared_triple_merges_into_one_system() {
        let records = vec![
            loc("a", "Nova", Some("Eden"), (1.0, 2.0, 3.0)),
            loc("b", "Nova", None, (1.0, 2.0, 3.0)),
            loc("c", "Vega", Some("Rust"), (1.0, 2.0, 3.0)),
        ];
        let systems = group_systems(&records);
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].location.data.id, "a");
        assert_eq!(
            systems[0].planet_data,
            vec![
                Discoverer {
                    username: "Nova".to_string(),
                    entries: vec!["Eden".to_string(), "b".to_string()],
                },
                Discoverer {
                    username: "Vega".to_string(),
                    entries: vec!["Rust".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_distinct_triples_keep_first_seen_order() {
        let records = vec![
            loc("a", "Nova", None, (5.0, 0.0, 0.0)),
            loc("b", "Nova", None, (1.0, 0.0, 0.0)),
            loc("c", "Nova", None, (5.0, 0.0, 0.0)),
        ];
        let systems = group_systems(&records);
        let ids: Vec<_> = systems.iter().map(|s| s.location.data.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_labels_recorded_once() {
        let records = vec![
            loc("a", "Nova", Some("Eden"), (1.0, 1.0, 1.0)),
            loc("b", "Nova", Some("Eden"), (1.0, 1.0, 1.0)),
        ];
        let systems = group_systems(&records);
        assert_eq!(systems[0].entry_count(), 1);
    }

    #[test]
    fn test_nearby_but_unequal_coordinates_stay_apart() {
        let records = vec![
            loc("a", "Nova", None, (1.0, 1.0, 1.0)),
            loc("b", "Nova", None, (1.0, 1.0, 1.000_001)),
        ];
        assert_eq!(group_systems(&records).len(), 2);
    }

    #[test]
    fn test_records_without_coords_skipped() {
        let mut partial = loc("a", "Nova", None, (1.0, 1.0, 1.0));
        partial.data.translated_y = None;
        let systems = group_systems(&[partial, loc("b", "Nova", None, (2.0, 2.0, 2.0))]);
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].location.data.id, "b");
    }

    #[test]
    fn test_group_remote_keeps_pagination() {
        let page = RemoteLocations {
            results: vec![
                loc("a", "Nova", None, (1.0, 1.0, 1.0)),
                loc("b", "Vega", None, (1.0, 1.0, 1.0)),
            ],
            count: 120,
            next: Some("next".to_string()),
            prev: None,
            multiple_selected_locations: false,
        };
        let (grouped, systems) = group_remote(&page);
        assert_eq!(grouped.results.len(), 1);
        assert_eq!(grouped.count, 120);
        assert_eq!(grouped.next.as_deref(), Some("next"));
        assert_eq!(systems[0].planet_data.len(), 2);
    }
}
