//! Itinerary types.
//!
//! An [`Itinerary`] is a complete journey from origin to destination,
//! expressed as an ordered sequence of legs. A leg is a single walk or a
//! single uninterrupted ride; legs tile the journey with no gaps and no
//! overlaps.

use chrono::Duration;

use super::{DomainError, TransitTime};

/// A walking leg: from the origin, between stops, or to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkLeg {
    pub start_time: TransitTime,
    pub end_time: TransitTime,
    pub from_name: String,
    pub to_name: String,
}

/// A transit leg: one uninterrupted ride on a single trip, including the
/// wait at the boarding stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitLeg {
    pub start_time: TransitTime,
    pub end_time: TransitTime,
    pub from_name: String,
    pub to_name: String,

    /// Short name of the route the trip runs on.
    pub route_short_name: String,

    /// Destination text shown on the vehicle.
    pub headsign: String,

    pub num_stops: u32,
}

/// One mode-homogeneous segment of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leg {
    Walk(WalkLeg),
    Transit(TransitLeg),
}

impl Leg {
    pub fn start_time(&self) -> TransitTime {
        match self {
            Leg::Walk(walk) => walk.start_time,
            Leg::Transit(transit) => transit.start_time,
        }
    }

    pub fn end_time(&self) -> TransitTime {
        match self {
            Leg::Walk(walk) => walk.end_time,
            Leg::Transit(transit) => transit.end_time,
        }
    }

    pub fn from_name(&self) -> &str {
        match self {
            Leg::Walk(walk) => &walk.from_name,
            Leg::Transit(transit) => &transit.from_name,
        }
    }

    pub fn to_name(&self) -> &str {
        match self {
            Leg::Walk(walk) => &walk.to_name,
            Leg::Transit(transit) => &transit.to_name,
        }
    }

    /// Returns the duration of this leg.
    pub fn duration(&self) -> Duration {
        self.end_time().signed_duration_since(self.start_time())
    }

    pub fn is_walk(&self) -> bool {
        matches!(self, Leg::Walk(_))
    }

    pub fn is_transit(&self) -> bool {
        matches!(self, Leg::Transit(_))
    }

    /// Returns the transit details if this is a transit leg.
    pub fn as_transit(&self) -> Option<&TransitLeg> {
        match self {
            Leg::Transit(transit) => Some(transit),
            Leg::Walk(_) => None,
        }
    }
}

/// A complete journey from an origin to a destination.
///
/// # Invariants
///
/// - At least one leg
/// - `legs[i].end_time == legs[i + 1].start_time` for all adjacent legs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    legs: Vec<Leg>,
}

impl Itinerary {
    /// Constructs an itinerary, validating the adjacency invariant.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `legs` is empty or if any pair of adjacent legs
    /// fails to share a boundary timestamp.
    pub fn new(legs: Vec<Leg>) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }

        for (i, window) in legs.windows(2).enumerate() {
            if window[0].end_time() != window[1].start_time() {
                return Err(DomainError::LegsNotContiguous(i, i + 1));
            }
        }

        Ok(Itinerary { legs })
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Departure time of the first leg.
    pub fn start_time(&self) -> TransitTime {
        self.legs[0].start_time()
    }

    /// Arrival time of the last leg.
    pub fn end_time(&self) -> TransitTime {
        self.legs[self.legs.len() - 1].end_time()
    }

    /// Total travel time, first departure to final arrival.
    pub fn total_duration(&self) -> Duration {
        self.end_time().signed_duration_since(self.start_time())
    }

    /// Number of transit legs.
    pub fn transit_leg_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_transit()).count()
    }
}
