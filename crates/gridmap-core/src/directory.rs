//! Static, read-only station directory.
//!
//! The directory is configuration data: it is loaded once at startup from a
//! TOML file (or the bundled default) and exposes lookups only.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GridmapError, Result};
use crate::types::{Station, StationKind, Zone};

const BUILTIN_STATIONS: &str = include_str!("../data/stations.toml");

/// On-disk shape of a directory file: a list of `[[stations]]` tables.
#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    stations: Vec<Station>,
}

/// Stations of one zone, as rendered by the sidebar.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneGroup<'a> {
    pub zone: Zone,
    pub stations: Vec<&'a Station>,
}

/// Ordered, validated collection of stations.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    stations: Vec<Station>,
}

impl StationDirectory {
    /// Build a directory, rejecting blank ids or names, duplicate ids and
    /// out-of-range coordinates.
    pub fn from_stations(stations: Vec<Station>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(stations.len());
        for station in &stations {
            if station.id.trim().is_empty() {
                return Err(GridmapError::BlankField {
                    id: station.id.clone(),
                    field: "id",
                });
            }
            if station.name.trim().is_empty() {
                return Err(GridmapError::BlankField {
                    id: station.id.clone(),
                    field: "name",
                });
            }
            if !seen.insert(station.id.as_str()) {
                return Err(GridmapError::DuplicateStation(station.id.clone()));
            }
            if !station.has_valid_coordinates() {
                return Err(GridmapError::InvalidCoordinates {
                    id: station.id.clone(),
                    lat: station.lat,
                    lng: station.lng,
                });
            }
        }
        Ok(Self { stations })
    }

    /// Parse a directory from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: DirectoryFile =
            toml::from_str(content).map_err(|e| GridmapError::Directory(e.to_string()))?;
        Self::from_stations(file.stations)
    }

    /// Load a directory from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let directory = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            stations = directory.len(),
            "Station directory loaded"
        );
        Ok(directory)
    }

    /// The directory bundled with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_STATIONS)
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Station> {
        self.stations.iter()
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Sidebar search: case-insensitive name or code substring.
    ///
    /// A blank term matches every station.
    pub fn search(&self, term: &str) -> Vec<&Station> {
        let needle = term.trim().to_lowercase();
        self.stations
            .iter()
            .filter(|s| needle.is_empty() || s.matches_term(&needle))
            .collect()
    }

    /// Stations grouped by zone in legend order.
    ///
    /// Within a zone, operational bases come first, then names sort
    /// alphabetically. While a search term is active, zones without matches
    /// are left out.
    pub fn grouped_by_zone(&self, term: &str) -> Vec<ZoneGroup<'_>> {
        let matches = self.search(term);
        let searching = !term.trim().is_empty();
        Zone::ALL
            .into_iter()
            .map(|zone| {
                let mut stations: Vec<&Station> =
                    matches.iter().copied().filter(|s| s.zone == zone).collect();
                stations.sort_by(|a, b| {
                    (b.kind == StationKind::Base)
                        .cmp(&(a.kind == StationKind::Base))
                        .then_with(|| a.name.cmp(&b.name))
                });
                ZoneGroup { zone, stations }
            })
            .filter(|group| !searching || !group.stations.is_empty())
            .collect()
    }

    /// Directory serialized as context for the external provider, one line per station.
    pub fn context_lines(&self) -> String {
        self.stations
            .iter()
            .map(|s| {
                format!(
                    "- {} (ID: {}, Type: {}) in {} zone. Lat: {}, Lng: {}. Address: {}",
                    s.name,
                    s.id,
                    s.kind,
                    s.zone.label(),
                    s.lat,
                    s.lng,
                    s.address.as_deref().unwrap_or("N/A")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a StationDirectory {
    type Item = &'a Station;
    type IntoIter = std::slice::Iter<'a, Station>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}
