//! Web layer for the rail pass planner.
//!
//! Provides JSON endpoints for running searches and editing the itinerary.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
