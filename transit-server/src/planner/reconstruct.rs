//! Itinerary reconstruction.
//!
//! Converts a goal state and its backtrace into a sequence of
//! human-meaningful legs: consecutive board/ride edges merge into one
//! transit leg, every walk edge becomes its own leg, and a final walking
//! leg covers the distance from the goal stop to the destination
//! coordinate.

use chrono::Duration;
use geo::{Distance, Haversine, Point};

use crate::domain::{Itinerary, Leg, StopId, TransitLeg, TransitTime, TripId, WalkLeg};
use crate::store::TransitStore;

use super::config::PlannerConfig;
use super::plan::PlanError;
use super::search::{Backtrace, Edge, SearchState, TraceLink};

/// Display name used for the request's origin coordinate.
const ORIGIN_NAME: &str = "Your Location";

/// Display name used for the request's destination coordinate.
const DESTINATION_NAME: &str = "Your Destination";

/// An in-progress merge of consecutive board/ride edges.
struct TransitRun {
    start_time: TransitTime,
    from_stop: StopId,
    trip: TripId,
    end_time: TransitTime,
    to_stop: StopId,
    merged_edges: u32,
}

/// Rebuild the winning path as an [`Itinerary`].
///
/// # Errors
///
/// Returns `Err` when a stop, trip or route referenced by the path is
/// missing from the store. That indicates corrupted schedule data, so it
/// is surfaced rather than retried.
pub(super) fn reconstruct_itinerary<S: TransitStore>(
    store: &S,
    config: &PlannerConfig,
    departure: TransitTime,
    destination: Point<f64>,
    goal: &SearchState,
    backtrace: &Backtrace,
) -> Result<Itinerary, PlanError> {
    // Walk the chain back to the synthetic start, then flip it into
    // chronological order.
    let mut chain: Vec<&SearchState> = Vec::new();
    let mut cursor = goal;
    loop {
        chain.push(cursor);
        let entry = backtrace
            .get(cursor)
            .ok_or_else(|| PlanError::inconsistent("backtrace chain is broken"))?;
        match &entry.prev {
            TraceLink::Origin => break,
            TraceLink::From(prev) => cursor = prev,
        }
    }
    chain.reverse();

    let mut legs: Vec<Leg> = Vec::new();
    let mut open: Option<TransitRun> = None;

    for state in chain {
        let entry = &backtrace[state];
        let start_time = match &entry.prev {
            TraceLink::Origin => departure,
            TraceLink::From(prev) => prev.time,
        };

        match &entry.edge {
            Edge::Board { stop, trip } => {
                if let Some(run) = open.take() {
                    legs.push(close_run(store, run)?);
                }
                open = Some(TransitRun {
                    start_time,
                    from_stop: stop.clone(),
                    trip: trip.clone(),
                    end_time: state.time,
                    to_stop: stop.clone(),
                    merged_edges: 1,
                });
            }
            Edge::Ride { to, .. } => {
                let run = open
                    .as_mut()
                    .ok_or_else(|| PlanError::inconsistent("ride edge without a boarding"))?;
                run.end_time = state.time;
                run.to_stop = to.clone();
                run.merged_edges += 1;
            }
            Edge::Walk { from, to } => {
                if let Some(run) = open.take() {
                    legs.push(close_run(store, run)?);
                }
                legs.push(Leg::Walk(WalkLeg {
                    start_time,
                    end_time: state.time,
                    from_name: stop_name(store, from)?,
                    to_name: stop_name(store, to)?,
                }));
            }
            Edge::WalkFromOrigin { to } => {
                if let Some(run) = open.take() {
                    legs.push(close_run(store, run)?);
                }
                legs.push(Leg::Walk(WalkLeg {
                    start_time,
                    end_time: state.time,
                    from_name: ORIGIN_NAME.to_string(),
                    to_name: stop_name(store, to)?,
                }));
            }
        }
    }

    if let Some(run) = open.take() {
        legs.push(close_run(store, run)?);
    }

    // Final walk from the goal stop to the destination coordinate, at the
    // same speed as transfers.
    let goal_stop = store
        .stop_by_id(&goal.stop)
        .ok_or_else(|| PlanError::inconsistent(format!("stop {} missing from the store", goal.stop)))?;
    let walk_secs = config.walk_secs(Haversine.distance(goal_stop.location, destination));
    legs.push(Leg::Walk(WalkLeg {
        start_time: goal.time,
        end_time: goal.time + Duration::seconds(walk_secs),
        from_name: goal_stop.name.clone(),
        to_name: DESTINATION_NAME.to_string(),
    }));

    Itinerary::new(legs).map_err(|e| PlanError::inconsistent(format!("malformed itinerary: {e}")))
}

fn close_run<S: TransitStore>(store: &S, run: TransitRun) -> Result<Leg, PlanError> {
    let (trip, route) = store
        .trip_with_route(&run.trip)
        .ok_or_else(|| PlanError::inconsistent(format!("trip {} missing from the store", run.trip)))?;

    Ok(Leg::Transit(TransitLeg {
        start_time: run.start_time,
        end_time: run.end_time,
        from_name: stop_name(store, &run.from_stop)?,
        to_name: stop_name(store, &run.to_stop)?,
        route_short_name: route.short_name.clone(),
        headsign: trip.headsign.clone(),
        num_stops: run.merged_edges,
    }))
}

fn stop_name<S: TransitStore>(store: &S, id: &StopId) -> Result<String, PlanError> {
    store
        .stop_by_id(id)
        .map(|stop| stop.name.clone())
        .ok_or_else(|| PlanError::inconsistent(format!("stop {id} missing from the store")))
}
