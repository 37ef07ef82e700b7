//! Sidebar panel: open/collapsed flag plus the per-zone accordion sections.
//!
//! Section toggles drive the zone filter:
//! - Opening a section makes its zone the active filter
//! - Closing the section of the active zone resets the filter to `All`
//! - Closing any other section leaves the filter alone

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use gridmap_core::{Zone, ZoneFilter};

use crate::cell::{Observable, Subscription};
use crate::filter::FilterState;

pub struct Sidebar {
    open: Observable<bool>,
    sections: Mutex<HashSet<Zone>>,
}

impl Default for Sidebar {
    fn default() -> Self {
        Self::new()
    }
}

impl Sidebar {
    /// Panel open with every zone section expanded.
    pub fn new() -> Self {
        Self {
            open: Observable::new(true),
            sections: Mutex::new(Zone::ALL.into_iter().collect()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    /// Open or collapse the panel. Returns whether the flag changed.
    pub fn set_open(&self, open: bool) -> bool {
        let changed = self.open.set_if_changed(open).is_some();
        if changed {
            tracing::debug!(open, "Sidebar toggled");
        }
        changed
    }

    pub fn toggle(&self) -> bool {
        let open = !self.is_open();
        self.set_open(open);
        open
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.open.subscribe(observer)
    }

    pub fn is_section_open(&self, zone: Zone) -> bool {
        self.sections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&zone)
    }

    /// Expanded sections in legend order.
    pub fn open_sections(&self) -> Vec<Zone> {
        let sections = self.sections.lock().unwrap_or_else(PoisonError::into_inner);
        Zone::ALL
            .into_iter()
            .filter(|zone| sections.contains(zone))
            .collect()
    }

    /// Flip one zone section and apply the filter rule.
    ///
    /// Returns whether the section is now open.
    pub fn toggle_section(&self, zone: Zone, filter: &FilterState) -> bool {
        let opening = {
            let mut sections = self.sections.lock().unwrap_or_else(PoisonError::into_inner);
            if sections.remove(&zone) {
                false
            } else {
                sections.insert(zone);
                true
            }
        };

        if opening {
            filter.set_filter(ZoneFilter::Zone(zone));
        } else if filter.current().is_zone(zone) {
            filter.set_filter(ZoneFilter::All);
        }
        tracing::debug!(zone = zone.key(), opening, filter = %filter.current(), "Section toggled");
        opening
    }
}
