//! Shared view state for the station map.
//!
//! Holds the single selected station and the active zone filter as
//! observable cells, plus the sidebar and map consumers that read and
//! drive them.

pub mod cell;
pub mod filter;
pub mod map;
pub mod selection;
pub mod sidebar;
pub mod workspace;

pub use cell::{Observable, Subscription};
pub use filter::FilterState;
pub use map::{Camera, FlyTo, MapView, Marker, MarkerShape, MarkerStyle, MarkerTier};
pub use selection::SelectionBroadcast;
pub use sidebar::Sidebar;
pub use workspace::MapWorkspace;
