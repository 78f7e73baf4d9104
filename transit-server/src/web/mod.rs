//! Thin HTTP layer.
//!
//! JSON glue over the planner and the schedule store: a planning endpoint
//! plus read-only entity browsing. No planning logic lives here.

mod dto;
mod routes;
mod state;

pub use dto::{CoordinateDto, PlanRequest, PlanResponse};
pub use routes::create_router;
pub use state::AppState;
