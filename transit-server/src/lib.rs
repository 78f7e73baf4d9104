//! Multi-modal transit journey planner.
//!
//! Plans journeys that combine walking with scheduled transit between two
//! geographic points, returning several diverse itineraries ranked by
//! estimated travel time.

pub mod domain;
pub mod planner;
pub mod proximity;
pub mod store;
pub mod web;
