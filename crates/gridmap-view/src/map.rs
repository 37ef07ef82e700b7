//! Map consumer of the shared state: marker styling from the zone filter and
//! the fly-to camera driven by the selection.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use gridmap_core::config::MapConfig;
use gridmap_core::{Station, StationDirectory, StationKind, Zone, ZoneFilter};

use crate::cell::Subscription;
use crate::selection::SelectionBroadcast;

/// Brand color used for every ESD marker regardless of zone.
pub const BRAND_BLUE: &str = "#004593";

/// Legend color of a zone.
pub fn zone_color(zone: Zone) -> &'static str {
    match zone {
        Zone::West => "#6b21a8",
        Zone::NorthCentral => "#dc2626",
        Zone::SouthAbc => "#16a34a",
        Zone::East => "#84cc16",
    }
}

// =============================================================================
// Markers
// =============================================================================

/// Size tier of a marker relative to the active filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerTier {
    Default,
    Emphasized,
    DeEmphasized,
}

impl MarkerTier {
    pub fn for_station(station: &Station, filter: ZoneFilter) -> Self {
        match filter {
            ZoneFilter::All => MarkerTier::Default,
            ZoneFilter::Zone(zone) if zone == station.zone => MarkerTier::Emphasized,
            ZoneFilter::Zone(_) => MarkerTier::DeEmphasized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    /// Larger round badge with the operational-base glyph.
    BaseBadge,
    Dot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub tier: MarkerTier,
    pub shape: MarkerShape,
    pub size_px: u32,
    pub scale: f64,
    pub opacity: f64,
    pub color: &'static str,
    /// Vertical tooltip offset above the marker.
    pub tooltip_offset_px: i32,
}

impl MarkerStyle {
    pub fn for_station(station: &Station, filter: ZoneFilter) -> Self {
        let tier = MarkerTier::for_station(station, filter);
        let is_base = station.kind == StationKind::Base;

        let (size_px, scale) = match (tier, is_base) {
            (MarkerTier::Default, true) => (32, 1.0),
            (MarkerTier::Default, false) => (16, 1.0),
            (MarkerTier::Emphasized, true) => (40, 1.1),
            (MarkerTier::Emphasized, false) => (24, 1.25),
            (MarkerTier::DeEmphasized, true) => (16, 0.75),
            (MarkerTier::DeEmphasized, false) => (8, 0.75),
        };

        Self {
            tier,
            shape: if is_base {
                MarkerShape::BaseBadge
            } else {
                MarkerShape::Dot
            },
            size_px,
            scale,
            opacity: if tier == MarkerTier::DeEmphasized { 0.5 } else { 1.0 },
            color: match station.kind {
                StationKind::Esd => BRAND_BLUE,
                _ => zone_color(station.zone),
            },
            tooltip_offset_px: if is_base { -25 } else { -15 },
        }
    }
}

/// One renderable marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub station_id: String,
    pub name: String,
    pub kind: StationKind,
    pub zone: Zone,
    pub lat: f64,
    pub lng: f64,
    pub selected: bool,
    pub style: MarkerStyle,
}

/// Markers for every station with valid coordinates, in directory order.
pub fn markers(
    directory: &StationDirectory,
    filter: ZoneFilter,
    selected: Option<&str>,
) -> Vec<Marker> {
    directory
        .iter()
        .filter(|station| station.has_valid_coordinates())
        .map(|station| Marker {
            station_id: station.id.clone(),
            name: station.name.clone(),
            kind: station.kind,
            zone: station.zone,
            lat: station.lat,
            lng: station.lng,
            selected: selected == Some(station.id.as_str()),
            style: MarkerStyle::for_station(station, filter),
        })
        .collect()
}

// =============================================================================
// Camera
// =============================================================================

/// Animated move to a selected station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlyTo {
    pub station_id: String,
    pub center: [f64; 2],
    pub zoom: u8,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    pub center: [f64; 2],
    pub zoom: u8,
    /// Present once a station has been selected.
    pub fly_to: Option<FlyTo>,
}

/// Map view state. Observes the selection for as long as it lives.
pub struct MapView {
    config: MapConfig,
    target: Arc<Mutex<Option<FlyTo>>>,
    _selection: Subscription,
}

impl MapView {
    pub fn new(config: MapConfig, selection: &SelectionBroadcast) -> Self {
        let target = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&target);
        let zoom = config.fly_to_zoom;
        let duration_ms = config.fly_to_duration_ms;

        let subscription = selection.subscribe(move |station: &Station| {
            let fly_to = FlyTo {
                station_id: station.id.clone(),
                center: [station.lat, station.lng],
                zoom,
                duration_ms,
            };
            tracing::debug!(station_id = %station.id, zoom, "Flying to station");
            // A newer selection replaces any animation still pending
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(fly_to);
        });

        Self {
            config,
            target,
            _selection: subscription,
        }
    }

    pub fn camera(&self) -> Camera {
        let fly_to = self
            .target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match fly_to {
            Some(fly_to) => Camera {
                center: fly_to.center,
                zoom: fly_to.zoom,
                fly_to: Some(fly_to),
            },
            None => Camera {
                center: self.config.default_center,
                zoom: self.config.default_zoom,
                fly_to: None,
            },
        }
    }
}
