//! Active zone filter read by the map when sizing markers.

use gridmap_core::ZoneFilter;

use crate::cell::{Observable, Subscription};

/// Either every zone or exactly one. Starts at [`ZoneFilter::All`].
#[derive(Clone, Default)]
pub struct FilterState {
    cell: Observable<ZoneFilter>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active filter. Observers are notified only when it changes.
    ///
    /// Returns whether the filter changed.
    pub fn set_filter(&self, filter: ZoneFilter) -> bool {
        match self.cell.set_if_changed(filter) {
            Some(previous) => {
                tracing::debug!(from = %previous, to = %filter, "Zone filter changed");
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> ZoneFilter {
        self.cell.get()
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&ZoneFilter) + Send + Sync + 'static,
    {
        self.cell.subscribe(observer)
    }
}
