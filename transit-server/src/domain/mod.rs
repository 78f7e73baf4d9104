//! Domain types for the transit journey planner.
//!
//! This module contains the core domain model: typed GTFS identifiers,
//! schedule time handling, the read-only reference entities served by the
//! data store, and the itinerary types returned to callers. Types enforce
//! their invariants at construction time, so code that receives these types
//! can trust their validity.

mod error;
mod id;
mod itinerary;
mod model;
mod time;

pub use error::DomainError;
pub use id::{RouteId, ShapeId, StopId, TripId};
pub use itinerary::{Itinerary, Leg, TransitLeg, WalkLeg};
pub use model::{Route, ShapePoint, Stop, StopTime, Trip};
pub use time::{TimeError, TimeOfDay, TransitTime};
