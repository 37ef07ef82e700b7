//! The currently selected station, shared by the sidebar, the assistant
//! panel and the map.

use gridmap_core::Station;

use crate::cell::{Observable, Subscription};

/// At most one station is selected. A selection is only ever replaced,
/// never cleared.
#[derive(Clone, Default)]
pub struct SelectionBroadcast {
    cell: Observable<Option<Station>>,
}

impl SelectionBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `station` the current selection and notify observers.
    pub fn select(&self, station: Station) {
        tracing::info!(station_id = %station.id, name = %station.name, "Station selected");
        self.cell.set(Some(station));
    }

    pub fn current(&self) -> Option<Station> {
        self.cell.get()
    }

    /// Observe future selections.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Station) + Send + Sync + 'static,
    {
        self.cell.subscribe(move |selected| {
            if let Some(station) = selected {
                observer(station);
            }
        })
    }
}
