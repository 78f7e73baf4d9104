//! GTFS feed loading.
//!
//! Reads the flat CSV files of a GTFS feed directory (`stops.txt`,
//! `routes.txt`, `trips.txt`, `stop_times.txt` and optionally
//! `shapes.txt`) into an [`InMemoryStore`]. Schedule times past midnight
//! wrap their hour modulo 24; the date is supplied later by each planning
//! request.

use std::path::{Path, PathBuf};

use geo::Point;
use serde::Deserialize;
use tracing::info;

use crate::domain::{
    Route, RouteId, ShapeId, ShapePoint, Stop, StopId, StopTime, TimeError, TimeOfDay, Trip, TripId,
};

use super::{InMemoryStore, StoreError};

/// Error raised while loading a GTFS feed.
#[derive(Debug, thiserror::Error)]
pub enum GtfsError {
    /// A feed file could not be opened or read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A feed record could not be parsed
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A schedule time string was malformed
    #[error("invalid time {value:?} in {path}: {source}")]
    Time {
        path: PathBuf,
        value: String,
        #[source]
        source: TimeError,
    },

    /// The loaded entities were inconsistent
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct RawStop {
    stop_id: String,
    #[serde(default)]
    stop_code: String,
    stop_name: String,
    #[serde(default)]
    stop_desc: String,
    stop_lat: f64,
    stop_lon: f64,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    route_id: String,
    #[serde(default)]
    route_short_name: String,
    #[serde(default)]
    route_long_name: String,
    #[serde(default)]
    route_color: String,
}

#[derive(Debug, Deserialize)]
struct RawTrip {
    trip_id: String,
    route_id: String,
    #[serde(default)]
    trip_headsign: String,
    #[serde(default)]
    direction_id: String,
    #[serde(default)]
    shape_id: String,
    #[serde(default)]
    wheelchair_accessible: String,
    #[serde(default)]
    bikes_allowed: String,
}

#[derive(Debug, Deserialize)]
struct RawStopTime {
    trip_id: String,
    stop_sequence: u32,
    stop_id: String,
    arrival_time: String,
    departure_time: String,
    #[serde(default)]
    pickup_type: String,
    #[serde(default)]
    drop_off_type: String,
    #[serde(default)]
    shape_dist_traveled: String,
    #[serde(default)]
    timepoint: String,
}

#[derive(Debug, Deserialize)]
struct RawShape {
    shape_id: String,
    shape_pt_lat: f64,
    shape_pt_lon: f64,
    shape_pt_sequence: u32,
    #[serde(default)]
    shape_dist_traveled: String,
}

/// Load a GTFS feed directory into an [`InMemoryStore`].
///
/// `shapes.txt` is optional; the other four files are required.
///
/// # Errors
///
/// Returns `Err` on unreadable files, malformed records, malformed time
/// strings, or referential inconsistencies between files.
pub fn load_gtfs_dir(dir: impl AsRef<Path>) -> Result<InMemoryStore, GtfsError> {
    let dir = dir.as_ref();

    let stops: Vec<Stop> = read_records(&dir.join("stops.txt"))?
        .into_iter()
        .map(|raw: RawStop| Stop {
            id: StopId::new(raw.stop_id),
            code: non_empty(raw.stop_code),
            name: raw.stop_name,
            description: raw.stop_desc,
            location: Point::new(raw.stop_lon, raw.stop_lat),
        })
        .collect();

    let routes: Vec<Route> = read_records(&dir.join("routes.txt"))?
        .into_iter()
        .map(|raw: RawRoute| Route {
            id: RouteId::new(raw.route_id),
            short_name: raw.route_short_name,
            long_name: raw.route_long_name,
            color: raw.route_color,
        })
        .collect();

    let trips: Vec<Trip> = read_records(&dir.join("trips.txt"))?
        .into_iter()
        .map(|raw: RawTrip| Trip {
            id: TripId::new(raw.trip_id),
            route_id: RouteId::new(raw.route_id),
            headsign: raw.trip_headsign,
            direction: parse_flag(&raw.direction_id, false),
            shape_id: non_empty(raw.shape_id).map(ShapeId::new),
            wheelchair_accessible: parse_flag(&raw.wheelchair_accessible, false),
            bikes_allowed: parse_flag(&raw.bikes_allowed, false),
        })
        .collect();

    let stop_times_path = dir.join("stop_times.txt");
    let stop_times: Vec<StopTime> = read_records(&stop_times_path)?
        .into_iter()
        .map(|raw: RawStopTime| {
            Ok(StopTime {
                trip_id: TripId::new(raw.trip_id),
                stop_sequence: raw.stop_sequence,
                stop_id: StopId::new(raw.stop_id),
                arrival: parse_time(&stop_times_path, &raw.arrival_time)?,
                departure: parse_time(&stop_times_path, &raw.departure_time)?,
                pickup: parse_flag(&raw.pickup_type, true),
                dropoff: parse_flag(&raw.drop_off_type, true),
                shape_dist_traveled: raw.shape_dist_traveled.parse().unwrap_or(0.0),
                timepoint: parse_flag(&raw.timepoint, true),
            })
        })
        .collect::<Result<_, GtfsError>>()?;

    let shapes_path = dir.join("shapes.txt");
    let shapes: Vec<ShapePoint> = if shapes_path.is_file() {
        read_records(&shapes_path)?
            .into_iter()
            .map(|raw: RawShape| ShapePoint {
                shape_id: ShapeId::new(raw.shape_id),
                latitude: raw.shape_pt_lat,
                longitude: raw.shape_pt_lon,
                sequence: raw.shape_pt_sequence,
                dist_traveled: raw.shape_dist_traveled.parse().unwrap_or(0.0),
            })
            .collect()
    } else {
        Vec::new()
    };

    let store = InMemoryStore::build(stops, routes, trips, stop_times, shapes)?;
    info!(
        stops = store.stop_count(),
        routes = store.route_count(),
        trips = store.trip_count(),
        stop_times = store.stop_time_count(),
        shape_points = store.shape_point_count(),
        "loaded GTFS feed"
    );
    Ok(store)
}

fn read_records<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, GtfsError> {
    let file = std::fs::File::open(path).map_err(|e| GtfsError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = csv::Reader::from_reader(file);
    reader
        .deserialize()
        .map(|record| {
            record.map_err(|e| GtfsError::Csv {
                path: path.to_path_buf(),
                source: e,
            })
        })
        .collect()
}

fn parse_time(path: &Path, value: &str) -> Result<TimeOfDay, GtfsError> {
    TimeOfDay::parse(value).map_err(|e| GtfsError::Time {
        path: path.to_path_buf(),
        value: value.to_string(),
        source: e,
    })
}

/// Parse a numeric GTFS flag column: blank keeps the default, "0" is
/// false, any other value is true.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim() {
        "" => default,
        "0" => false,
        _ => true,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TransitStore;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn write_feed(dir: &Path) {
        write_file(
            dir,
            "stops.txt",
            "stop_id,stop_code,stop_name,stop_desc,stop_lat,stop_lon\n\
             s1,100,Central Station,,45.0,-75.0\n\
             s2,,Market Square,North side,45.01,-75.0\n",
        );
        write_file(
            dir,
            "routes.txt",
            "route_id,route_short_name,route_long_name,route_color\n\
             R1,99,Mainline,0000FF\n",
        );
        write_file(
            dir,
            "trips.txt",
            "route_id,trip_id,trip_headsign,direction_id,shape_id,wheelchair_accessible,bikes_allowed\n\
             R1,t1,Downtown,0,,1,\n",
        );
        write_file(
            dir,
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence,pickup_type,drop_off_type,shape_dist_traveled,timepoint\n\
             t1,25:10:00,25:10:00,s1,1,0,0,0,1\n\
             t1,25:20:00,25:20:00,s2,2,0,0,1.5,1\n",
        );
    }

    #[test]
    fn loads_a_minimal_feed() {
        let dir = tempfile::tempdir().unwrap();
        write_feed(dir.path());

        let store = load_gtfs_dir(dir.path()).unwrap();
        assert_eq!(store.stop_count(), 2);
        assert_eq!(store.route_count(), 1);
        assert_eq!(store.trip_count(), 1);
        assert_eq!(store.stop_time_count(), 2);
        assert_eq!(store.shape_point_count(), 0);

        let stop = store.stop_by_id(&StopId::new("s1")).unwrap();
        assert_eq!(stop.name, "Central Station");
        assert_eq!(stop.code.as_deref(), Some("100"));
        assert_eq!(stop.latitude(), 45.0);

        let (trip, route) = store.trip_with_route(&TripId::new("t1")).unwrap();
        assert_eq!(trip.headsign, "Downtown");
        assert!(trip.wheelchair_accessible);
        assert!(!trip.bikes_allowed);
        assert_eq!(route.short_name, "99");
    }

    #[test]
    fn times_past_midnight_wrap() {
        let dir = tempfile::tempdir().unwrap();
        write_feed(dir.path());

        let store = load_gtfs_dir(dir.path()).unwrap();
        let departures = store.departures_at(
            &StopId::new("s1"),
            TimeOfDay::parse("01:00:00").unwrap(),
            10,
        );
        assert_eq!(departures.len(), 1);
        assert_eq!(
            departures[0].departure,
            TimeOfDay::parse("01:10:00").unwrap()
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_gtfs_dir(dir.path()).unwrap_err();
        assert!(matches!(err, GtfsError::Io { .. }));
    }

    #[test]
    fn dangling_route_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        write_feed(dir.path());
        write_file(
            dir.path(),
            "trips.txt",
            "route_id,trip_id,trip_headsign,direction_id,shape_id,wheelchair_accessible,bikes_allowed\n\
             R9,t1,Downtown,0,,,\n",
        );

        let err = load_gtfs_dir(dir.path()).unwrap_err();
        assert!(matches!(err, GtfsError::Store(StoreError::UnknownRoute { .. })));
    }

    #[test]
    fn malformed_time_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_feed(dir.path());
        write_file(
            dir.path(),
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence,pickup_type,drop_off_type,shape_dist_traveled,timepoint\n\
             t1,banana,09:00:00,s1,1,,,,\n",
        );

        let err = load_gtfs_dir(dir.path()).unwrap_err();
        assert!(matches!(err, GtfsError::Time { .. }));
    }

    #[test]
    fn optional_shapes_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        write_feed(dir.path());
        write_file(
            dir.path(),
            "shapes.txt",
            "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence,shape_dist_traveled\n\
             sh1,45.0,-75.0,1,0\n\
             sh1,45.01,-75.0,2,1.2\n",
        );

        let store = load_gtfs_dir(dir.path()).unwrap();
        assert_eq!(store.shape_point_count(), 2);
    }
}
