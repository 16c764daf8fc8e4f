//! Resolving a clicked map point back to location records.

use crate::coords::{sector_address, sector_key};
use crate::location::{Location, LocationData};

/// The outcome of selecting a sector on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Exactly one record lies in the sector.
    Single(LocationData),
    /// Several records share the sector. The caller shows them as a search
    /// result titled `search`.
    Multiple {
        results: Vec<Location>,
        search: String,
    },
}

/// Find the records whose sector key equals `sector_id`.
///
/// Returns `None` when nothing matches.
#[must_use]
pub fn select_sector(locations: &[Location], sector_id: &str) -> Option<Selection> {
    let mut results: Vec<Location> = locations
        .iter()
        .filter(|l| sector_key(&l.data).as_deref() == Some(sector_id))
        .cloned()
        .collect();

    match results.len() {
        0 => None,
        1 => results.pop().map(|l| Selection::Single(l.data)),
        _ => {
            let address = sector_address(&results[0].data).unwrap_or_else(|| sector_id.to_string());
            Some(Selection::Multiple {
                search: format!("Sector {address}"),
                results,
            })
        }
    }
}
