//! The diverse-path trip planner.
//!
//! Runs the time-expanded search up to five times, penalising edges used
//! by earlier paths so later iterations are steered onto alternatives.
//! This approximates k-shortest-path diversity by discouraging edge reuse
//! rather than computing exact alternatives, trading exactness for speed.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::NaiveDateTime;
use geo::Point;
use tracing::{debug, info};

use crate::domain::{Itinerary, StopId, TransitTime};
use crate::proximity::{ProximityIndex, index_for_stops};
use crate::store::TransitStore;

use super::config::PlannerConfig;
use super::reconstruct::reconstruct_itinerary;
use super::search::{Backtrace, PenaltyTable, SearchContext, SearchOutcome, SearchState, TraceLink};

/// Error from trip planning.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanError {
    /// The request itself was malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The schedule data referenced an entity that does not exist
    #[error("inconsistent schedule data: {0}")]
    InconsistentData(String),
}

impl PlanError {
    pub(super) fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentData(message.into())
    }
}

/// Result of one planning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanResult {
    /// Found itineraries, best-first. May be empty when no stop is within
    /// walking range of either endpoint, or when no connection exists.
    pub itineraries: Vec<Itinerary>,

    /// True when the request deadline cut the search short; the
    /// itineraries found up to that point are still returned.
    pub truncated: bool,
}

/// Plans journeys between two coordinates over a transit schedule.
///
/// A planner instance is built per request: it snapshots stop locations
/// into a proximity index of its own, and each `plan` call keeps its
/// penalty table to itself. Nothing mutable is shared across concurrent
/// requests; the store is only read.
pub struct TripPlanner<'a, S: TransitStore> {
    store: &'a S,
    config: PlannerConfig,
    proximity: Box<dyn ProximityIndex + Send + Sync>,
    stop_locations: HashMap<StopId, Point<f64>>,
}

impl<'a, S: TransitStore> TripPlanner<'a, S> {
    /// Create a planner over a snapshot of the store's stops.
    pub fn new(store: &'a S, config: PlannerConfig) -> Self {
        let stops = store.all_stops();
        let stop_locations = stops
            .iter()
            .map(|stop| (stop.id.clone(), stop.location))
            .collect();
        Self {
            store,
            config,
            proximity: index_for_stops(stops),
            stop_locations,
        }
    }

    /// Plan up to `path_count_target` diverse itineraries from `origin`
    /// to `destination`, departing at `departure`.
    ///
    /// Returns an empty result when no stop lies within walking radius of
    /// either endpoint; that is the normal unreachable outcome, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `Err` for out-of-range or non-finite coordinates, and for
    /// schedule data that references missing entities.
    pub fn plan(
        &self,
        origin: Point<f64>,
        destination: Point<f64>,
        departure: NaiveDateTime,
    ) -> Result<PlanResult, PlanError> {
        validate_coordinate("origin", origin)?;
        validate_coordinate("destination", destination)?;

        let started = Instant::now();
        let departure = TransitTime::new(departure);

        let origin_stops = self
            .proximity
            .nearby_stops(origin, self.config.max_walk_meters);
        let goal_stops: HashSet<StopId> = self
            .proximity
            .nearby_stops(destination, self.config.max_walk_meters)
            .into_iter()
            .map(|near| near.stop_id)
            .collect();

        if origin_stops.is_empty() || goal_stops.is_empty() {
            debug!("no stops within walking radius of an endpoint");
            return Ok(PlanResult {
                itineraries: Vec::new(),
                truncated: false,
            });
        }

        let context = SearchContext {
            store: self.store,
            proximity: self.proximity.as_ref(),
            config: &self.config,
            destination,
            departure,
            origin_stops: &origin_stops,
            goal_stops: &goal_stops,
            stop_locations: &self.stop_locations,
        };

        let mut penalties = PenaltyTable::default();
        let mut itineraries: Vec<Itinerary> = Vec::new();
        let mut truncated = false;

        for iteration in 0..self.config.path_count_target {
            match context.run(&penalties, started) {
                SearchOutcome::Goal { state, backtrace } => {
                    let itinerary = reconstruct_itinerary(
                        self.store,
                        &self.config,
                        departure,
                        destination,
                        &state,
                        &backtrace,
                    )?;
                    self.penalise_path(&state, &backtrace, &mut penalties);

                    // Penalties discourage but cannot forbid reuse; when
                    // the only viable path wins again, drop the repeat.
                    if itineraries.contains(&itinerary) {
                        debug!(iteration, "search repeated an already found path");
                    } else {
                        itineraries.push(itinerary);
                    }
                }
                SearchOutcome::NoPath => {
                    debug!(iteration, "no further path");
                    break;
                }
                SearchOutcome::DeadlineExceeded => {
                    debug!(iteration, "search deadline exceeded");
                    truncated = true;
                    break;
                }
            }
        }

        info!(
            found = itineraries.len(),
            truncated, "planning request finished"
        );
        Ok(PlanResult {
            itineraries,
            truncated,
        })
    }

    /// Add the configured penalty to every edge identity on the winning
    /// path, stacking with penalties from earlier iterations.
    fn penalise_path(
        &self,
        goal: &SearchState,
        backtrace: &Backtrace,
        penalties: &mut PenaltyTable,
    ) {
        let mut raw_cost = 0;
        let mut edges = 0;
        let mut cursor = goal;
        while let Some(entry) = backtrace.get(cursor) {
            penalties.add(entry.edge.clone(), self.config.penalty_secs);
            raw_cost += entry.cost_secs;
            edges += 1;
            match &entry.prev {
                TraceLink::Origin => break,
                TraceLink::From(prev) => cursor = prev,
            }
        }
        debug!(edges, raw_cost, "penalised winning path");
    }
}

fn validate_coordinate(which: &str, point: Point<f64>) -> Result<(), PlanError> {
    let (lon, lat) = (point.x(), point.y());
    let valid = lon.is_finite()
        && lat.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon);
    if !valid {
        return Err(PlanError::InvalidRequest(format!(
            "{which} coordinate ({lat}, {lon}) is not a valid WGS84 position"
        )));
    }
    Ok(())
}
