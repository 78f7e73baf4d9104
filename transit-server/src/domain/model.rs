//! Read-only schedule reference entities.
//!
//! These types mirror the GTFS entities the data store serves. They are
//! loaded once and never mutated by the planning core.

use geo::Point;

use super::{RouteId, ShapeId, StopId, TimeOfDay, TripId};

/// A transit stop with its geographic position.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: StopId,

    /// Rider-facing stop code, where the feed provides one.
    pub code: Option<String>,

    pub name: String,
    pub description: String,

    /// WGS84 position, x = longitude, y = latitude.
    pub location: Point<f64>,
}

impl Stop {
    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }
}

/// A transit route (a named line such as a bus or tram service).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: RouteId,
    pub short_name: String,
    pub long_name: String,

    /// Display colour as a hex string without the leading `#`.
    pub color: String,
}

impl Route {
    /// The name to show riders: the short name, or the long name when the
    /// feed leaves the short name blank.
    pub fn display_name(&self) -> &str {
        if self.short_name.is_empty() {
            &self.long_name
        } else {
            &self.short_name
        }
    }
}

/// One scheduled run of a vehicle along a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,

    /// The route this trip belongs to. Must reference an existing
    /// [`Route`]; the store enforces this when it is built.
    pub route_id: RouteId,

    /// Destination text shown on the vehicle.
    pub headsign: String,

    pub direction: bool,
    pub shape_id: Option<ShapeId>,
    pub wheelchair_accessible: bool,
    pub bikes_allowed: bool,
}

/// One scheduled call of a trip at a stop.
///
/// `(trip_id, stop_sequence)` is unique and totally ordered within a trip;
/// that ordering defines the physical stop order along the trip. Arrival
/// and departure are times of day; trips running past midnight store
/// wrapped values (see [`TimeOfDay`]).
#[derive(Debug, Clone, PartialEq)]
pub struct StopTime {
    pub trip_id: TripId,
    pub stop_sequence: u32,
    pub stop_id: StopId,
    pub arrival: TimeOfDay,
    pub departure: TimeOfDay,
    pub pickup: bool,
    pub dropoff: bool,

    /// Cumulative distance travelled along the trip shape, in feed units.
    pub shape_dist_traveled: f64,

    /// Whether the times are exact rather than interpolated.
    pub timepoint: bool,
}

/// One point of a shape polyline.
///
/// Shapes are carried for completeness; the planning core does not consume
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePoint {
    pub shape_id: ShapeId,
    pub latitude: f64,
    pub longitude: f64,
    pub sequence: u32,
    pub dist_traveled: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_display_name_prefers_short_name() {
        let mut route = Route {
            id: RouteId::new("R1"),
            short_name: "99".into(),
            long_name: "Mainline".into(),
            color: "0000FF".into(),
        };
        assert_eq!(route.display_name(), "99");

        route.short_name.clear();
        assert_eq!(route.display_name(), "Mainline");
    }

    #[test]
    fn stop_exposes_coordinates() {
        let stop = Stop {
            id: StopId::new("s1"),
            code: None,
            name: "Central".into(),
            description: String::new(),
            location: Point::new(-75.0, 45.0),
        };
        assert_eq!(stop.latitude(), 45.0);
        assert_eq!(stop.longitude(), -75.0);
    }
}
