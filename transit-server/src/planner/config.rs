//! Planner configuration.

use std::time::Duration;

/// Configuration parameters for journey planning.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Walking speed for transfers and origin/destination access (km/h).
    pub walking_speed_kph: f64,

    /// Assumed crow-fly vehicle speed for the search heuristic (km/h).
    /// Faster than walking, but not guaranteed to bound every real
    /// schedule, so first-found paths are not provably optimal.
    pub crowfly_speed_kph: f64,

    /// Maximum walking distance to or between stops (meters).
    pub max_walk_meters: f64,

    /// Cost added to an edge for each previous path that used it
    /// (seconds). Penalties stack across iterations.
    pub penalty_secs: i64,

    /// How many upcoming departures to consider when boarding at a stop.
    /// Bounds fan-out at high-frequency stops; a faster but more deeply
    /// queued departure can be hidden by this cut-off.
    pub departure_fanout: usize,

    /// Maximum number of itineraries to return.
    pub path_count_target: usize,

    /// Wall-clock limit for one planning request (milliseconds). When
    /// exceeded, the search stops and whatever was found is returned with
    /// a truncation flag.
    pub deadline_ms: u64,
}

impl PlannerConfig {
    /// Returns the request deadline as a Duration.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Seconds to walk `meters` at the configured walking speed.
    pub fn walk_secs(&self, meters: f64) -> i64 {
        speed_secs(meters, self.walking_speed_kph)
    }

    /// Heuristic seconds to cover `meters` at the crow-fly speed.
    pub fn crowfly_secs(&self, meters: f64) -> i64 {
        speed_secs(meters, self.crowfly_speed_kph)
    }
}

fn speed_secs(meters: f64, kph: f64) -> i64 {
    (meters / 1000.0 / kph * 3600.0).round() as i64
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            walking_speed_kph: 5.0,
            crowfly_speed_kph: 25.0,
            max_walk_meters: 500.0,
            penalty_secs: 180,
            departure_fanout: 5,
            path_count_target: 5,
            deadline_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.walking_speed_kph, 5.0);
        assert_eq!(config.crowfly_speed_kph, 25.0);
        assert_eq!(config.max_walk_meters, 500.0);
        assert_eq!(config.penalty_secs, 180);
        assert_eq!(config.departure_fanout, 5);
        assert_eq!(config.path_count_target, 5);
        assert_eq!(config.deadline(), Duration::from_secs(10));
    }

    #[test]
    fn walk_time_at_five_kph() {
        let config = PlannerConfig::default();
        // 5 km/h covers 500 m in 6 minutes.
        assert_eq!(config.walk_secs(500.0), 360);
        assert_eq!(config.walk_secs(0.0), 0);
    }

    #[test]
    fn crowfly_is_faster_than_walking() {
        let config = PlannerConfig::default();
        assert!(config.crowfly_secs(1000.0) < config.walk_secs(1000.0));
        // 25 km/h covers 25 km in one hour.
        assert_eq!(config.crowfly_secs(25_000.0), 3600);
    }
}
