//! Spatial proximity queries over the stop network.
//!
//! Answers "which stops are within walking distance of this coordinate",
//! using great-circle distance. Two interchangeable strategies sit behind
//! the [`ProximityIndex`] trait: an exhaustive scan, which is plenty for
//! networks of a few thousand stops, and an R-tree backed range query for
//! larger networks. Both return identical result sets.

use geo::{Distance, Haversine, Point};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use crate::domain::{Stop, StopId};

/// Conservative meters-per-degree used to size R-tree search envelopes.
///
/// One degree of latitude is about 111.2 km; using a smaller figure makes
/// the candidate envelope strictly wider than the requested radius, so the
/// exact haversine filter afterwards never loses a stop.
const ENVELOPE_METERS_PER_DEGREE: f64 = 109_000.0;

/// Stop count up to which the exhaustive scan is the better strategy.
const SCAN_STRATEGY_LIMIT: usize = 5_000;

/// A stop found within a proximity query radius.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStop {
    pub stop_id: StopId,
    pub distance_meters: f64,
}

/// A radius query over stop positions.
///
/// Implementations must return the same set for the same inputs: every
/// stop whose great-circle distance from `point` is at most
/// `radius_meters`, sorted by stop id.
pub trait ProximityIndex {
    fn nearby_stops(&self, point: Point<f64>, radius_meters: f64) -> Vec<NearbyStop>;
}

/// Pick a strategy for a stop snapshot by network size.
pub fn index_for_stops(stops: &[Stop]) -> Box<dyn ProximityIndex + Send + Sync> {
    if stops.len() <= SCAN_STRATEGY_LIMIT {
        Box::new(ScanIndex::new(stops))
    } else {
        Box::new(RTreeIndex::new(stops))
    }
}

/// Exhaustive-scan strategy: haversine distance to every stop.
#[derive(Debug, Clone)]
pub struct ScanIndex {
    stops: Vec<(StopId, Point<f64>)>,
}

impl ScanIndex {
    pub fn new(stops: &[Stop]) -> Self {
        let mut stops: Vec<_> = stops
            .iter()
            .map(|stop| (stop.id.clone(), stop.location))
            .collect();
        stops.sort_by(|a, b| a.0.cmp(&b.0));
        Self { stops }
    }
}

impl ProximityIndex for ScanIndex {
    fn nearby_stops(&self, point: Point<f64>, radius_meters: f64) -> Vec<NearbyStop> {
        self.stops
            .iter()
            .filter_map(|(id, location)| {
                let distance = Haversine.distance(point, *location);
                (distance <= radius_meters).then(|| NearbyStop {
                    stop_id: id.clone(),
                    distance_meters: distance,
                })
            })
            .collect()
    }
}

/// R-tree strategy: envelope candidate lookup, then exact haversine
/// filtering.
pub struct RTreeIndex {
    tree: RTree<GeomWithData<[f64; 2], StopId>>,
}

impl RTreeIndex {
    pub fn new(stops: &[Stop]) -> Self {
        let entries = stops
            .iter()
            .map(|stop| GeomWithData::new([stop.location.x(), stop.location.y()], stop.id.clone()))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }
}

impl ProximityIndex for RTreeIndex {
    fn nearby_stops(&self, point: Point<f64>, radius_meters: f64) -> Vec<NearbyStop> {
        let lat_delta = radius_meters / ENVELOPE_METERS_PER_DEGREE;
        // Longitude degrees shrink towards the poles.
        let lon_scale = point.y().to_radians().cos().abs().max(0.01);
        let lon_delta = lat_delta / lon_scale;
        let envelope = AABB::from_corners(
            [point.x() - lon_delta, point.y() - lat_delta],
            [point.x() + lon_delta, point.y() + lat_delta],
        );

        let mut nearby: Vec<NearbyStop> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|entry| {
                let location = Point::new(entry.geom()[0], entry.geom()[1]);
                let distance = Haversine.distance(point, location);
                (distance <= radius_meters).then(|| NearbyStop {
                    stop_id: entry.data.clone(),
                    distance_meters: distance,
                })
            })
            .collect();
        nearby.sort_by(|a, b| a.stop_id.cmp(&b.stop_id));
        nearby
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use proptest::prelude::*;

    fn stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop {
            id: StopId::new(id),
            code: None,
            name: format!("Stop {id}"),
            description: String::new(),
            location: Point::new(lon, lat),
        }
    }

    fn ids(nearby: &[NearbyStop]) -> Vec<&str> {
        nearby.iter().map(|n| n.stop_id.as_str()).collect()
    }

    #[test]
    fn scan_filters_by_radius() {
        // Roughly 111 m per 0.001 degrees of latitude.
        let stops = vec![
            stop("near", 45.001, -75.0),
            stop("far", 45.1, -75.0),
            stop("here", 45.0, -75.0),
        ];
        let index = ScanIndex::new(&stops);

        let nearby = index.nearby_stops(Point::new(-75.0, 45.0), 500.0);
        assert_eq!(ids(&nearby), vec!["here", "near"]);

        let here = &nearby[0];
        assert!(here.distance_meters < 1.0);
    }

    #[test]
    fn results_sorted_by_stop_id() {
        let stops = vec![
            stop("c", 45.0, -75.0),
            stop("a", 45.0005, -75.0),
            stop("b", 45.001, -75.0),
        ];
        let query = Point::new(-75.0, 45.0);

        let scan = ScanIndex::new(&stops).nearby_stops(query, 1_000.0);
        let rtree = RTreeIndex::new(&stops).nearby_stops(query, 1_000.0);
        assert_eq!(ids(&scan), vec!["a", "b", "c"]);
        assert_eq!(ids(&rtree), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_network() {
        let index = ScanIndex::new(&[]);
        assert!(index.nearby_stops(Point::new(0.0, 0.0), 500.0).is_empty());
    }

    #[test]
    fn strategy_choice_by_size() {
        let few = vec![stop("a", 45.0, -75.0)];
        // Only checking that the chooser builds a usable index either way.
        let index = index_for_stops(&few);
        assert_eq!(index.nearby_stops(Point::new(-75.0, 45.0), 100.0).len(), 1);
    }

    proptest! {
        /// The two strategies are interchangeable: identical result sets
        /// for arbitrary stop fields and query points.
        #[test]
        fn strategies_agree(
            coords in prop::collection::vec((44.9f64..45.1, -75.1f64..-74.9), 0..40),
            query_lat in 44.9f64..45.1,
            query_lon in -75.1f64..-74.9,
            radius in 10.0f64..5_000.0,
        ) {
            let stops: Vec<Stop> = coords
                .iter()
                .enumerate()
                .map(|(i, (lat, lon))| stop(&format!("s{i:03}"), *lat, *lon))
                .collect();
            let query = Point::new(query_lon, query_lat);

            let scan = ScanIndex::new(&stops).nearby_stops(query, radius);
            let rtree = RTreeIndex::new(&stops).nearby_stops(query, radius);
            prop_assert_eq!(ids(&scan), ids(&rtree));
        }
    }
}
