//! Time-expanded A* search.
//!
//! One invocation finds a single best-weighted path from the origin
//! coordinate to any stop within walking range of the destination. A
//! search state combines a timestamp with a physical stop and, when the
//! traveller is aboard a vehicle, the active trip and its position along
//! that trip.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Instant;

use chrono::Duration;
use geo::{Distance, Haversine, Point};

use crate::domain::{StopId, TransitTime, TripId};
use crate::proximity::ProximityIndex;
use crate::store::TransitStore;

use super::config::PlannerConfig;

/// A node in the time-expanded search space.
///
/// Two states are equal iff all four fields are equal. The derived
/// ordering doubles as the priority-queue tie-breaker, which keeps the
/// search deterministic when priorities are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchState {
    /// Current timestamp.
    pub time: TransitTime,

    /// The stop the traveller is at.
    pub stop: StopId,

    /// The trip the traveller is aboard, if any.
    pub trip: Option<TripId>,

    /// Stop sequence of the active trip's current call. Zero when not
    /// aboard.
    pub seq: u32,
}

/// A tagged move between two search states.
///
/// The edge value (variant plus endpoints plus trip id) is also the
/// identity penalties are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Walk from the request's origin coordinate to a stop.
    WalkFromOrigin { to: StopId },

    /// Walk transfer between two stops.
    Walk { from: StopId, to: StopId },

    /// Enter a trip at a stop. No spatial displacement; the cost is the
    /// wait until departure.
    Board { stop: StopId, trip: TripId },

    /// Advance one stop along the boarded trip.
    Ride {
        trip: TripId,
        from: StopId,
        to: StopId,
    },
}

/// Predecessor of a state in the backtrace: another state, or the
/// synthetic start of the path.
#[derive(Debug, Clone)]
pub(super) enum TraceLink {
    Origin,
    From(SearchState),
}

/// Backtrace record for one reached state.
#[derive(Debug, Clone)]
pub(super) struct TraceEntry {
    pub(super) prev: TraceLink,
    pub(super) edge: Edge,

    /// Raw edge cost in seconds, excluding any penalty.
    pub(super) cost_secs: i64,
}

pub(super) type Backtrace = HashMap<SearchState, TraceEntry>;

/// Accumulated penalties on edge identities, scoped to one planning
/// request. Never shared across requests.
#[derive(Debug, Clone, Default)]
pub(super) struct PenaltyTable {
    table: HashMap<Edge, i64>,
}

impl PenaltyTable {
    pub(super) fn penalty(&self, edge: &Edge) -> i64 {
        self.table.get(edge).copied().unwrap_or(0)
    }

    /// Add to an edge's standing penalty. Penalties stack when an edge is
    /// reused across iterations.
    pub(super) fn add(&mut self, edge: Edge, secs: i64) {
        *self.table.entry(edge).or_insert(0) += secs;
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.table.len()
    }
}

/// Result of one search invocation.
pub(super) enum SearchOutcome {
    /// A goal state was popped; the backtrace reaches back to the origin.
    Goal {
        state: SearchState,
        backtrace: Backtrace,
    },

    /// The queue was exhausted without reaching the destination.
    NoPath,

    /// The request deadline elapsed mid-search.
    DeadlineExceeded,
}

/// Entry in the search priority queue.
///
/// Ordered by priority, then cost, then the full state tuple, so equal
/// priorities expand in a stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueEntry {
    priority: i64,
    cost: i64,
    state: SearchState,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.cost.cmp(&other.cost))
            .then_with(|| self.state.cmp(&other.state))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Inputs shared by the search iterations of one planning request.
pub(super) struct SearchContext<'a, S: TransitStore> {
    pub(super) store: &'a S,
    pub(super) proximity: &'a dyn ProximityIndex,
    pub(super) config: &'a PlannerConfig,

    /// Destination coordinate, for the heuristic.
    pub(super) destination: Point<f64>,

    /// Request departure timestamp.
    pub(super) departure: TransitTime,

    /// Stops within walking radius of the origin, with their distances.
    pub(super) origin_stops: &'a [crate::proximity::NearbyStop],

    /// Stops within walking radius of the destination.
    pub(super) goal_stops: &'a HashSet<StopId>,

    /// Per-request snapshot of stop positions keyed by stop id.
    pub(super) stop_locations: &'a HashMap<StopId, Point<f64>>,
}

impl<S: TransitStore> SearchContext<'_, S> {
    /// Run one A* search.
    ///
    /// The first popped state within walking range of the destination
    /// wins. The heuristic assumes a fixed crow-fly vehicle speed, which
    /// is not a proven lower bound against every real schedule, so the
    /// found path is best-effort rather than provably optimal.
    pub(super) fn run(&self, penalties: &PenaltyTable, started: Instant) -> SearchOutcome {
        let mut queue: BinaryHeap<Reverse<QueueEntry>> = BinaryHeap::new();
        let mut best_cost: HashMap<SearchState, i64> = HashMap::new();
        let mut backtrace: Backtrace = HashMap::new();

        for near in self.origin_stops {
            let walk_secs = self.config.walk_secs(near.distance_meters);
            let state = SearchState {
                time: self.departure + Duration::seconds(walk_secs),
                stop: near.stop_id.clone(),
                trip: None,
                seq: 0,
            };
            best_cost.insert(state.clone(), walk_secs);
            backtrace.insert(
                state.clone(),
                TraceEntry {
                    prev: TraceLink::Origin,
                    edge: Edge::WalkFromOrigin {
                        to: near.stop_id.clone(),
                    },
                    cost_secs: walk_secs,
                },
            );
            queue.push(Reverse(QueueEntry {
                priority: walk_secs + self.heuristic(&state.stop),
                cost: walk_secs,
                state,
            }));
        }

        while let Some(Reverse(entry)) = queue.pop() {
            if started.elapsed() >= self.config.deadline() {
                return SearchOutcome::DeadlineExceeded;
            }

            let QueueEntry { cost, state, .. } = entry;

            // A cheaper path to this state was found after this entry was
            // queued.
            if best_cost.get(&state).is_some_and(|&best| cost > best) {
                continue;
            }

            if self.goal_stops.contains(&state.stop) {
                return SearchOutcome::Goal { state, backtrace };
            }

            self.expand(
                &state,
                cost,
                penalties,
                &mut queue,
                &mut best_cost,
                &mut backtrace,
            );
        }

        SearchOutcome::NoPath
    }

    fn expand(
        &self,
        state: &SearchState,
        cost: i64,
        penalties: &PenaltyTable,
        queue: &mut BinaryHeap<Reverse<QueueEntry>>,
        best_cost: &mut HashMap<SearchState, i64>,
        backtrace: &mut Backtrace,
    ) {
        // Riding to the next scheduled call is the only way the active
        // trip advances.
        if let Some(trip) = &state.trip {
            if let Some(next) = self.store.next_stop_time(trip, state.seq) {
                let ride_secs = state.time.time_of_day().seconds_until(next.arrival);
                let successor = SearchState {
                    time: state.time + Duration::seconds(ride_secs),
                    stop: next.stop_id.clone(),
                    trip: Some(trip.clone()),
                    seq: next.stop_sequence,
                };
                let edge = Edge::Ride {
                    trip: trip.clone(),
                    from: state.stop.clone(),
                    to: next.stop_id.clone(),
                };
                self.relax(
                    state, cost, successor, edge, ride_secs, penalties, queue, best_cost, backtrace,
                );
            }
        }

        // Boarding keeps the traveller at the same stop; the following
        // ride edge moves them. Only the nearest few departures are
        // considered, which bounds fan-out at high-frequency stops.
        for boarding in self.store.departures_at(
            &state.stop,
            state.time.time_of_day(),
            self.config.departure_fanout,
        ) {
            let wait_secs = state.time.time_of_day().seconds_until(boarding.departure);
            let successor = SearchState {
                time: state.time + Duration::seconds(wait_secs),
                stop: state.stop.clone(),
                trip: Some(boarding.trip_id.clone()),
                seq: boarding.stop_sequence,
            };
            let edge = Edge::Board {
                stop: state.stop.clone(),
                trip: boarding.trip_id.clone(),
            };
            self.relax(
                state, cost, successor, edge, wait_secs, penalties, queue, best_cost, backtrace,
            );
        }

        // Walking transfers reset the active trip.
        let Some(&location) = self.stop_locations.get(&state.stop) else {
            return;
        };
        for near in self
            .proximity
            .nearby_stops(location, self.config.max_walk_meters)
        {
            if near.stop_id == state.stop {
                continue;
            }
            let walk_secs = self.config.walk_secs(near.distance_meters);
            let successor = SearchState {
                time: state.time + Duration::seconds(walk_secs),
                stop: near.stop_id.clone(),
                trip: None,
                seq: 0,
            };
            let edge = Edge::Walk {
                from: state.stop.clone(),
                to: near.stop_id.clone(),
            };
            self.relax(
                state, cost, successor, edge, walk_secs, penalties, queue, best_cost, backtrace,
            );
        }
    }

    /// Relaxation step: apply any standing penalty for the edge identity,
    /// and record the successor if the penalised total improves on its
    /// best known cost. The recorded edge cost excludes the penalty.
    #[allow(clippy::too_many_arguments)]
    fn relax(
        &self,
        current: &SearchState,
        current_cost: i64,
        successor: SearchState,
        edge: Edge,
        edge_secs: i64,
        penalties: &PenaltyTable,
        queue: &mut BinaryHeap<Reverse<QueueEntry>>,
        best_cost: &mut HashMap<SearchState, i64>,
        backtrace: &mut Backtrace,
    ) {
        let tentative = current_cost + edge_secs + penalties.penalty(&edge);
        if best_cost
            .get(&successor)
            .is_some_and(|&best| tentative >= best)
        {
            return;
        }

        best_cost.insert(successor.clone(), tentative);
        backtrace.insert(
            successor.clone(),
            TraceEntry {
                prev: TraceLink::From(current.clone()),
                edge,
                cost_secs: edge_secs,
            },
        );
        queue.push(Reverse(QueueEntry {
            priority: tentative + self.heuristic(&successor.stop),
            cost: tentative,
            state: successor,
        }));
    }

    /// Remaining-time estimate: crow-fly distance to the destination at
    /// the configured fast uniform speed.
    fn heuristic(&self, stop: &StopId) -> i64 {
        match self.stop_locations.get(stop) {
            Some(&location) => self
                .config
                .crowfly_secs(Haversine.distance(location, self.destination)),
            None => 0,
        }
    }
}
