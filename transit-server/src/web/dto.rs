//! Data transfer objects for web requests and responses.

use chrono::NaiveDateTime;
use geo::Point;
use serde::{Deserialize, Serialize};

use crate::domain::{Leg, Route, Stop, Trip};
use crate::planner::PlanResult;

/// A WGS84 coordinate in a request body.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoordinateDto {
    pub latitude: f64,
    pub longitude: f64,
}

impl CoordinateDto {
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Request to plan a journey.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub origin: CoordinateDto,
    pub destination: CoordinateDto,

    /// Departure timestamp, e.g. "2025-11-16T08:55:00".
    pub departure: NaiveDateTime,
}

/// One leg of a planned itinerary.
#[derive(Debug, Serialize)]
pub struct LegResult {
    /// "walk" or "transit"
    pub mode: &'static str,

    pub start_time: String,
    pub end_time: String,
    pub from: String,
    pub to: String,
    pub duration_secs: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headsign: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_stops: Option<u32>,
}

impl From<&Leg> for LegResult {
    fn from(leg: &Leg) -> Self {
        let transit = leg.as_transit();
        LegResult {
            mode: if leg.is_walk() { "walk" } else { "transit" },
            start_time: leg.start_time().to_string(),
            end_time: leg.end_time().to_string(),
            from: leg.from_name().to_string(),
            to: leg.to_name().to_string(),
            duration_secs: leg.duration().num_seconds(),
            route: transit.map(|t| t.route_short_name.clone()),
            headsign: transit.map(|t| t.headsign.clone()),
            num_stops: transit.map(|t| t.num_stops),
        }
    }
}

/// One planned itinerary.
#[derive(Debug, Serialize)]
pub struct ItineraryResult {
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: i64,
    pub legs: Vec<LegResult>,
}

/// Response to a planning request.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub itineraries: Vec<ItineraryResult>,
    pub truncated: bool,
}

impl From<&PlanResult> for PlanResponse {
    fn from(result: &PlanResult) -> Self {
        PlanResponse {
            itineraries: result
                .itineraries
                .iter()
                .map(|itinerary| ItineraryResult {
                    start_time: itinerary.start_time().to_string(),
                    end_time: itinerary.end_time().to_string(),
                    duration_secs: itinerary.total_duration().num_seconds(),
                    legs: itinerary.legs().iter().map(LegResult::from).collect(),
                })
                .collect(),
            truncated: result.truncated,
        }
    }
}

/// A stop in browse results.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Stop> for StopResult {
    fn from(stop: &Stop) -> Self {
        StopResult {
            id: stop.id.to_string(),
            code: stop.code.clone(),
            name: stop.name.clone(),
            description: stop.description.clone(),
            latitude: stop.latitude(),
            longitude: stop.longitude(),
        }
    }
}

/// A route in browse results.
#[derive(Debug, Serialize)]
pub struct RouteResult {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub color: String,
}

impl From<&Route> for RouteResult {
    fn from(route: &Route) -> Self {
        RouteResult {
            id: route.id.to_string(),
            short_name: route.short_name.clone(),
            long_name: route.long_name.clone(),
            color: route.color.clone(),
        }
    }
}

/// A trip in browse results, joined with its route.
#[derive(Debug, Serialize)]
pub struct TripResult {
    pub id: String,
    pub route_id: String,
    pub route_short_name: String,
    pub headsign: String,
    pub direction: bool,
    pub wheelchair_accessible: bool,
    pub bikes_allowed: bool,
}

impl TripResult {
    pub fn new(trip: &Trip, route: &Route) -> Self {
        TripResult {
            id: trip.id.to_string(),
            route_id: trip.route_id.to_string(),
            route_short_name: route.short_name.clone(),
            headsign: trip.headsign.clone(),
            direction: trip.direction,
            wheelchair_accessible: trip.wheelchair_accessible,
            bikes_allowed: trip.bikes_allowed,
        }
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TransitLeg, TransitTime, WalkLeg};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> TransitTime {
        TransitTime::new(
            NaiveDate::from_ymd_opt(2025, 11, 16)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
        )
    }

    #[test]
    fn plan_request_deserialises() {
        let request: PlanRequest = serde_json::from_str(
            r#"{
                "origin": {"latitude": 45.0, "longitude": -75.0},
                "destination": {"latitude": 45.1, "longitude": -75.0},
                "departure": "2025-11-16T08:55:00"
            }"#,
        )
        .unwrap();

        assert_eq!(request.origin.latitude, 45.0);
        assert_eq!(request.destination.to_point().y(), 45.1);
        assert_eq!(request.departure.to_string(), "2025-11-16 08:55:00");
    }

    #[test]
    fn walk_leg_omits_transit_fields() {
        let leg = Leg::Walk(WalkLeg {
            start_time: at(8, 55),
            end_time: at(9, 0),
            from_name: "Your Location".into(),
            to_name: "Stop A".into(),
        });

        let json = serde_json::to_value(LegResult::from(&leg)).unwrap();
        assert_eq!(json["mode"], "walk");
        assert_eq!(json["duration_secs"], 300);
        assert!(json.get("route").is_none());
        assert!(json.get("num_stops").is_none());
    }

    #[test]
    fn transit_leg_carries_route_details() {
        let leg = Leg::Transit(TransitLeg {
            start_time: at(9, 0),
            end_time: at(9, 5),
            from_name: "Stop A".into(),
            to_name: "Stop B".into(),
            route_short_name: "R1".into(),
            headsign: "To Downtown".into(),
            num_stops: 2,
        });

        let json = serde_json::to_value(LegResult::from(&leg)).unwrap();
        assert_eq!(json["mode"], "transit");
        assert_eq!(json["route"], "R1");
        assert_eq!(json["headsign"], "To Downtown");
        assert_eq!(json["num_stops"], 2);
        assert_eq!(json["start_time"], "2025-11-16T09:00:00");
    }
}
