use serde::{Deserialize, Serialize};

use crate::types::{Station, ZoneFilter};

/// Domain events raised by the shared view state.
///
/// Events are emitted after a state cell changes and consumed by:
/// - The SSE broadcast channel (for map front-ends)
/// - The trace log (for debugging)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum MapEvent {
    /// A station became the current selection; the map should fly to it.
    StationSelected {
        station_id: String,
        name: String,
        lat: f64,
        lng: f64,
    },

    /// The active zone filter changed; markers should be resized.
    FilterChanged { filter: ZoneFilter },

    /// The sidebar panel was opened or collapsed.
    SidebarToggled { open: bool },
}

impl MapEvent {
    pub fn selected(station: &Station) -> Self {
        MapEvent::StationSelected {
            station_id: station.id.clone(),
            name: station.name.clone(),
            lat: station.lat,
            lng: station.lng,
        }
    }

    /// SSE event name for this variant.
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::StationSelected { .. } => "station_selected",
            MapEvent::FilterChanged { .. } => "filter_changed",
            MapEvent::SidebarToggled { .. } => "sidebar_toggled",
        }
    }
}
