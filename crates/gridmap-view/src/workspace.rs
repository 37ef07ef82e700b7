//! Composition of the shared view state: one selection, one zone filter,
//! the sidebar and the map, wired together over a station directory.

use std::sync::Arc;

use gridmap_core::config::MapConfig;
use gridmap_core::{GridmapError, MapEvent, Result, Station, StationDirectory, Zone, ZoneGroup};

use crate::cell::Subscription;
use crate::filter::FilterState;
use crate::map::{markers, Camera, MapView, Marker};
use crate::selection::SelectionBroadcast;
use crate::sidebar::Sidebar;

pub struct MapWorkspace {
    directory: Arc<StationDirectory>,
    config: MapConfig,
    selection: SelectionBroadcast,
    filter: FilterState,
    sidebar: Sidebar,
    map: MapView,
}

impl MapWorkspace {
    pub fn new(directory: Arc<StationDirectory>, config: MapConfig) -> Self {
        let selection = SelectionBroadcast::new();
        let map = MapView::new(config.clone(), &selection);
        Self {
            directory,
            config,
            selection,
            filter: FilterState::new(),
            sidebar: Sidebar::new(),
            map,
        }
    }

    pub fn directory(&self) -> &StationDirectory {
        &self.directory
    }

    pub fn selection(&self) -> &SelectionBroadcast {
        &self.selection
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sidebar(&self) -> &Sidebar {
        &self.sidebar
    }

    /// Select a station by id, from a sidebar click or an inline reply action.
    ///
    /// On viewports narrower than the mobile breakpoint the sidebar collapses
    /// so the map is visible. `None` means the width is unknown and leaves
    /// the sidebar as is.
    pub fn select_station(&self, station_id: &str, viewport_width: Option<u32>) -> Result<Station> {
        let station = self
            .directory
            .get(station_id)
            .cloned()
            .ok_or_else(|| GridmapError::StationNotFound(station_id.to_string()))?;

        self.selection.select(station.clone());

        if viewport_width.is_some_and(|width| width < self.config.mobile_breakpoint_px) {
            self.sidebar.set_open(false);
        }
        Ok(station)
    }

    pub fn toggle_section(&self, zone: Zone) -> bool {
        self.sidebar.toggle_section(zone, &self.filter)
    }

    /// Sidebar list: stations grouped by zone, filtered by a search term.
    pub fn grouped(&self, term: &str) -> Vec<ZoneGroup<'_>> {
        self.directory.grouped_by_zone(term)
    }

    pub fn markers(&self) -> Vec<Marker> {
        let selected = self.selection.current();
        markers(
            &self.directory,
            self.filter.current(),
            selected.as_ref().map(|s| s.id.as_str()),
        )
    }

    pub fn camera(&self) -> Camera {
        self.map.camera()
    }

    /// Forward every state change as a [`MapEvent`].
    ///
    /// The listener runs synchronously on the thread that made the change.
    pub fn subscribe_events<F>(&self, listener: F) -> Vec<Subscription>
    where
        F: Fn(MapEvent) + Send + Sync + 'static,
    {
        let listener = Arc::new(listener);

        let on_select = Arc::clone(&listener);
        let on_filter = Arc::clone(&listener);
        let on_sidebar = listener;

        vec![
            self.selection
                .subscribe(move |station| on_select(MapEvent::selected(station))),
            self.filter
                .subscribe(move |filter| on_filter(MapEvent::FilterChanged { filter: *filter })),
            self.sidebar
                .subscribe(move |open| on_sidebar(MapEvent::SidebarToggled { open: *open })),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use gridmap_core::ZoneFilter;

    use crate::map::MarkerTier;

    fn workspace() -> MapWorkspace {
        MapWorkspace::new(
            Arc::new(StationDirectory::builtin().unwrap()),
            MapConfig::default(),
        )
    }

    #[test]
    fn test_select_station_updates_selection_and_camera() {
        let ws = workspace();
        let station = ws.select_station("s1", None).unwrap();
        assert_eq!(station.id, "s1");
        assert_eq!(ws.selection().current().unwrap().id, "s1");
        assert_eq!(ws.camera().fly_to.unwrap().station_id, "s1");
        assert!(ws.sidebar().is_open());
    }

    #[test]
    fn test_select_unknown_station() {
        let ws = workspace();
        let err = ws.select_station("zz9", None).unwrap_err();
        assert!(matches!(err, GridmapError::StationNotFound(ref id) if id == "zz9"));
        assert!(ws.selection().current().is_none());
    }

    #[test]
    fn test_narrow_viewport_collapses_sidebar() {
        let ws = workspace();
        ws.select_station("w1", Some(1024)).unwrap();
        assert!(ws.sidebar().is_open());
        ws.select_station("w1", Some(768)).unwrap();
        assert!(ws.sidebar().is_open());
        ws.select_station("w1", Some(767)).unwrap();
        assert!(!ws.sidebar().is_open());
    }

    #[test]
    fn test_toggle_section_resizes_markers() {
        let ws = workspace();
        ws.toggle_section(Zone::East);
        ws.toggle_section(Zone::East);
        assert_eq!(ws.filter().current(), ZoneFilter::Zone(Zone::East));

        let list = ws.markers();
        for marker in &list {
            let expected = if marker.zone == Zone::East {
                MarkerTier::Emphasized
            } else {
                MarkerTier::DeEmphasized
            };
            assert_eq!(marker.style.tier, expected, "{}", marker.station_id);
        }
    }

    #[test]
    fn test_markers_flag_current_selection() {
        let ws = workspace();
        ws.select_station("e2", None).unwrap();
        let selected: Vec<String> = ws
            .markers()
            .into_iter()
            .filter(|m| m.selected)
            .map(|m| m.station_id)
            .collect();
        assert_eq!(selected, vec!["e2".to_string()]);
    }

    #[test]
    fn test_events_forwarded_in_order() {
        let ws = workspace();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let _subs = ws.subscribe_events(move |event| sink.lock().unwrap().push(event));

        ws.toggle_section(Zone::West);
        ws.toggle_section(Zone::West);
        ws.select_station("w2", Some(400)).unwrap();

        let names: Vec<&str> = events.lock().unwrap().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["filter_changed", "station_selected", "sidebar_toggled"]);
    }

    #[test]
    fn test_dropping_event_subscriptions_stops_forwarding() {
        let ws = workspace();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subs = ws.subscribe_events(move |event| sink.lock().unwrap().push(event));
        drop(subs);
        ws.select_station("w1", None).unwrap();
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_grouped_search() {
        let ws = workspace();
        let groups = ws.grouped("osasco");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].stations.len(), 2);
    }
}
