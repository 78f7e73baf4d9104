//! The transit data store.
//!
//! Read-only schedule data behind the [`TransitStore`] trait. The planner
//! only ever sees this trait, so tests can seed a small in-memory network
//! and production code can load a full GTFS feed through the same type.

mod gtfs;

pub use gtfs::{GtfsError, load_gtfs_dir};

use std::collections::HashMap;

use crate::domain::{Route, RouteId, ShapePoint, Stop, StopId, StopTime, TimeOfDay, Trip, TripId};

/// Error raised while assembling a store from loaded entities.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Duplicate entity identifier
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// Trip references a route that does not exist
    #[error("trip {trip} references unknown route {route}")]
    UnknownRoute { trip: TripId, route: RouteId },

    /// Stop time references a trip that does not exist
    #[error("stop time references unknown trip {0}")]
    UnknownTrip(TripId),

    /// Stop time references a stop that does not exist
    #[error("stop time for trip {trip} references unknown stop {stop}")]
    UnknownStop { trip: TripId, stop: StopId },

    /// Two stop times share a (trip, sequence) key
    #[error("duplicate stop time for trip {trip} at sequence {sequence}")]
    DuplicateStopTime { trip: TripId, sequence: u32 },
}

/// Read-only access to schedule data.
///
/// This is the only surface the planning core uses; it must behave as a
/// consistent snapshot for the lifetime of a planning request.
pub trait TransitStore {
    /// Every stop in the network, for proximity cache population.
    fn all_stops(&self) -> &[Stop];

    /// Every route in the network.
    fn all_routes(&self) -> &[Route];

    /// Upcoming departures from a stop with departure time at or after
    /// `after`, ascending by departure time, at most `limit` entries.
    ///
    /// Ties on departure time are broken by trip id, so the order is
    /// stable across calls.
    fn departures_at(&self, stop: &StopId, after: TimeOfDay, limit: usize) -> Vec<&StopTime>;

    /// The next scheduled call of `trip` strictly after `sequence`, or
    /// `None` at the end of the trip.
    fn next_stop_time(&self, trip: &TripId, sequence: u32) -> Option<&StopTime>;

    /// Look up a stop by id.
    fn stop_by_id(&self, id: &StopId) -> Option<&Stop>;

    /// Look up a trip together with its route.
    fn trip_with_route(&self, id: &TripId) -> Option<(&Trip, &Route)>;
}

/// In-memory [`TransitStore`] with prebuilt lookup indexes.
///
/// Immutable once built; shared by reference across concurrent planning
/// requests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    stops: Vec<Stop>,
    routes: Vec<Route>,
    trips: Vec<Trip>,
    stop_times: Vec<StopTime>,
    shapes: Vec<ShapePoint>,

    stop_index: HashMap<StopId, usize>,
    route_index: HashMap<RouteId, usize>,
    trip_index: HashMap<TripId, usize>,

    /// Stop time indexes per stop, sorted by (departure, trip, sequence).
    departures: HashMap<StopId, Vec<usize>>,

    /// Stop time indexes per trip, sorted by sequence.
    trip_calls: HashMap<TripId, Vec<usize>>,
}

impl InMemoryStore {
    /// Assemble a store, building indexes and validating referential
    /// integrity.
    ///
    /// # Errors
    ///
    /// Returns `Err` on duplicate identifiers, trips referencing unknown
    /// routes, or stop times referencing unknown trips or stops.
    pub fn build(
        stops: Vec<Stop>,
        routes: Vec<Route>,
        trips: Vec<Trip>,
        stop_times: Vec<StopTime>,
        shapes: Vec<ShapePoint>,
    ) -> Result<Self, StoreError> {
        let mut store = InMemoryStore {
            stops,
            routes,
            trips,
            stop_times,
            shapes,
            ..Default::default()
        };

        for (i, stop) in store.stops.iter().enumerate() {
            if store.stop_index.insert(stop.id.clone(), i).is_some() {
                return Err(StoreError::DuplicateId {
                    kind: "stop",
                    id: stop.id.to_string(),
                });
            }
        }
        for (i, route) in store.routes.iter().enumerate() {
            if store.route_index.insert(route.id.clone(), i).is_some() {
                return Err(StoreError::DuplicateId {
                    kind: "route",
                    id: route.id.to_string(),
                });
            }
        }
        for (i, trip) in store.trips.iter().enumerate() {
            if !store.route_index.contains_key(&trip.route_id) {
                return Err(StoreError::UnknownRoute {
                    trip: trip.id.clone(),
                    route: trip.route_id.clone(),
                });
            }
            if store.trip_index.insert(trip.id.clone(), i).is_some() {
                return Err(StoreError::DuplicateId {
                    kind: "trip",
                    id: trip.id.to_string(),
                });
            }
        }

        for (i, stop_time) in store.stop_times.iter().enumerate() {
            if !store.trip_index.contains_key(&stop_time.trip_id) {
                return Err(StoreError::UnknownTrip(stop_time.trip_id.clone()));
            }
            if !store.stop_index.contains_key(&stop_time.stop_id) {
                return Err(StoreError::UnknownStop {
                    trip: stop_time.trip_id.clone(),
                    stop: stop_time.stop_id.clone(),
                });
            }
            store
                .departures
                .entry(stop_time.stop_id.clone())
                .or_default()
                .push(i);
            store
                .trip_calls
                .entry(stop_time.trip_id.clone())
                .or_default()
                .push(i);
        }

        let stop_times = &store.stop_times;
        for indexes in store.departures.values_mut() {
            indexes.sort_by(|&a, &b| {
                let (a, b) = (&stop_times[a], &stop_times[b]);
                (a.departure, &a.trip_id, a.stop_sequence)
                    .cmp(&(b.departure, &b.trip_id, b.stop_sequence))
            });
        }
        for indexes in store.trip_calls.values_mut() {
            indexes.sort_by_key(|&i| stop_times[i].stop_sequence);
            for window in indexes.windows(2) {
                if stop_times[window[0]].stop_sequence == stop_times[window[1]].stop_sequence {
                    return Err(StoreError::DuplicateStopTime {
                        trip: stop_times[window[0]].trip_id.clone(),
                        sequence: stop_times[window[0]].stop_sequence,
                    });
                }
            }
        }

        Ok(store)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    pub fn stop_time_count(&self) -> usize {
        self.stop_times.len()
    }

    pub fn shape_point_count(&self) -> usize {
        self.shapes.len()
    }
}

impl TransitStore for InMemoryStore {
    fn all_stops(&self) -> &[Stop] {
        &self.stops
    }

    fn all_routes(&self) -> &[Route] {
        &self.routes
    }

    fn departures_at(&self, stop: &StopId, after: TimeOfDay, limit: usize) -> Vec<&StopTime> {
        let Some(indexes) = self.departures.get(stop) else {
            return Vec::new();
        };
        let first = indexes.partition_point(|&i| self.stop_times[i].departure < after);
        indexes[first..]
            .iter()
            .take(limit)
            .map(|&i| &self.stop_times[i])
            .collect()
    }

    fn next_stop_time(&self, trip: &TripId, sequence: u32) -> Option<&StopTime> {
        let indexes = self.trip_calls.get(trip)?;
        let next = indexes.partition_point(|&i| self.stop_times[i].stop_sequence <= sequence);
        indexes.get(next).map(|&i| &self.stop_times[i])
    }

    fn stop_by_id(&self, id: &StopId) -> Option<&Stop> {
        self.stop_index.get(id).map(|&i| &self.stops[i])
    }

    fn trip_with_route(&self, id: &TripId) -> Option<(&Trip, &Route)> {
        let trip = self.trip_index.get(id).map(|&i| &self.trips[i])?;
        let route = self.route_index.get(&trip.route_id).map(|&i| &self.routes[i])?;
        Some((trip, route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    fn stop(id: &str) -> Stop {
        Stop {
            id: StopId::new(id),
            code: None,
            name: format!("Stop {id}"),
            description: String::new(),
            location: Point::new(-75.0, 45.0),
        }
    }

    fn route(id: &str) -> Route {
        Route {
            id: RouteId::new(id),
            short_name: id.into(),
            long_name: format!("Route {id}"),
            color: "FFFFFF".into(),
        }
    }

    fn trip(id: &str, route: &str) -> Trip {
        Trip {
            id: TripId::new(id),
            route_id: RouteId::new(route),
            headsign: "Downtown".into(),
            direction: false,
            shape_id: None,
            wheelchair_accessible: false,
            bikes_allowed: false,
        }
    }

    fn call(trip: &str, seq: u32, stop: &str, departure: &str) -> StopTime {
        let time = TimeOfDay::parse(departure).unwrap();
        StopTime {
            trip_id: TripId::new(trip),
            stop_sequence: seq,
            stop_id: StopId::new(stop),
            arrival: time,
            departure: time,
            pickup: true,
            dropoff: true,
            shape_dist_traveled: 0.0,
            timepoint: true,
        }
    }

    fn sample_store() -> InMemoryStore {
        InMemoryStore::build(
            vec![stop("a"), stop("b")],
            vec![route("R1"), route("R2")],
            vec![trip("t1", "R1"), trip("t2", "R2"), trip("t3", "R1")],
            vec![
                call("t1", 1, "a", "09:00:00"),
                call("t1", 2, "b", "09:05:00"),
                call("t2", 1, "a", "08:30:00"),
                call("t2", 2, "b", "08:40:00"),
                call("t3", 1, "a", "09:00:00"),
                call("t3", 2, "b", "09:10:00"),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn departures_ordered_and_limited() {
        let store = sample_store();
        let all = store.departures_at(&StopId::new("a"), TimeOfDay::parse("00:00:00").unwrap(), 10);
        let ids: Vec<_> = all.iter().map(|st| st.trip_id.as_str()).collect();
        // Equal departure times tie-break by trip id.
        assert_eq!(ids, vec!["t2", "t1", "t3"]);

        let limited =
            store.departures_at(&StopId::new("a"), TimeOfDay::parse("00:00:00").unwrap(), 2);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn departures_filtered_by_time() {
        let store = sample_store();
        let after =
            store.departures_at(&StopId::new("a"), TimeOfDay::parse("08:45:00").unwrap(), 10);
        let ids: Vec<_> = after.iter().map(|st| st.trip_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);

        // Boundary is inclusive.
        let at_nine =
            store.departures_at(&StopId::new("a"), TimeOfDay::parse("09:00:00").unwrap(), 10);
        assert_eq!(at_nine.len(), 2);
    }

    #[test]
    fn departures_at_unknown_stop_is_empty() {
        let store = sample_store();
        assert!(
            store
                .departures_at(&StopId::new("zz"), TimeOfDay::parse("00:00:00").unwrap(), 10)
                .is_empty()
        );
    }

    #[test]
    fn next_stop_time_walks_the_trip() {
        let store = sample_store();
        let next = store.next_stop_time(&TripId::new("t1"), 1).unwrap();
        assert_eq!(next.stop_sequence, 2);
        assert_eq!(next.stop_id, StopId::new("b"));

        assert!(store.next_stop_time(&TripId::new("t1"), 2).is_none());
        assert!(store.next_stop_time(&TripId::new("nope"), 0).is_none());
    }

    #[test]
    fn lookups() {
        let store = sample_store();
        assert_eq!(store.stop_by_id(&StopId::new("a")).unwrap().name, "Stop a");
        assert!(store.stop_by_id(&StopId::new("zz")).is_none());

        let (trip, route) = store.trip_with_route(&TripId::new("t2")).unwrap();
        assert_eq!(trip.id, TripId::new("t2"));
        assert_eq!(route.id, RouteId::new("R2"));
    }

    #[test]
    fn build_rejects_dangling_route() {
        let err = InMemoryStore::build(
            vec![stop("a")],
            vec![route("R1")],
            vec![trip("t1", "R9")],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::UnknownRoute { .. }));
    }

    #[test]
    fn build_rejects_dangling_stop_reference() {
        let err = InMemoryStore::build(
            vec![stop("a")],
            vec![route("R1")],
            vec![trip("t1", "R1")],
            vec![call("t1", 1, "ghost", "09:00:00")],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::UnknownStop { .. }));
    }

    #[test]
    fn build_rejects_duplicate_sequence() {
        let err = InMemoryStore::build(
            vec![stop("a"), stop("b")],
            vec![route("R1")],
            vec![trip("t1", "R1")],
            vec![
                call("t1", 1, "a", "09:00:00"),
                call("t1", 1, "b", "09:05:00"),
            ],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateStopTime { .. }));
    }

    #[test]
    fn build_rejects_duplicate_ids() {
        let err = InMemoryStore::build(
            vec![stop("a"), stop("a")],
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { kind: "stop", .. }));
    }
}
