use thiserror::Error;

/// Top-level error type for the grid map system.
///
/// Subsystem crates define their own error types and implement
/// `From<GridmapError>` so that the `?` operator works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GridmapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Duplicate station id: {0}")]
    DuplicateStation(String),

    #[error("Station {id:?} has a blank {field}")]
    BlankField { id: String, field: &'static str },

    #[error("Invalid coordinates for station {id}: lat={lat}, lng={lng}")]
    InvalidCoordinates { id: String, lat: f64, lng: f64 },

    #[error("Station not found: {0}")]
    StationNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for GridmapError {
    fn from(err: toml::de::Error) -> Self {
        GridmapError::Config(err.to_string())
    }
}

/// A specialized `Result` type for grid map operations.
pub type Result<T> = std::result::Result<T, GridmapError>;
