//! HTTP surface for the grid station map.
//!
//! Exposes the station directory, the assistant session, the shared
//! selection/filter state and the map projections over REST, plus an SSE
//! stream of map events for front-ends.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
