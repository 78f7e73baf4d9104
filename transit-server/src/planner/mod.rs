//! The journey planning engine.
//!
//! Answers "how do I get from this coordinate to that coordinate, leaving
//! at this time" over a static transit schedule. One A* search over a
//! time-expanded state space produces a single best path; the planner runs
//! it repeatedly, penalising edges already used, to assemble up to five
//! diverse itineraries.

mod config;
mod plan;
mod reconstruct;
mod search;

pub use config::PlannerConfig;
pub use plan::{PlanError, PlanResult, TripPlanner};
pub use search::{Edge, SearchState};
