pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod types;

pub use config::GridmapConfig;
pub use directory::{StationDirectory, ZoneGroup};
pub use error::{GridmapError, Result};
pub use events::MapEvent;
pub use types::*;
