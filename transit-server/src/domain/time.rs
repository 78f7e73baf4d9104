//! Schedule time handling.
//!
//! GTFS provides schedule times as "HH:MM:SS" strings where the hour may
//! exceed 23 for trips that run past midnight. This module provides
//! [`TimeOfDay`], which normalises such values by wrapping the hour modulo
//! 24 and stores only the time of day, and [`TransitTime`], a date-aware
//! instant used during search. The calendar date is supplied by the
//! planning request, never stored per schedule record.

use chrono::{Duration, NaiveDateTime, Timelike};
use std::fmt;
use std::ops::Add;

/// Number of seconds in one schedule day.
const SECS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing an invalid schedule time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A wall-clock time of day on the schedule, stored as seconds from
/// midnight.
///
/// Values parsed from GTFS wrap the hour component modulo 24, so
/// "25:10:00" and "01:10:00" denote the same time of day.
///
/// # Examples
///
/// ```
/// use transit_server::domain::TimeOfDay;
///
/// let after_midnight = TimeOfDay::parse("25:10:00").unwrap();
/// assert_eq!(after_midnight, TimeOfDay::parse("01:10:00").unwrap());
/// assert_eq!(after_midnight.to_string(), "01:10:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    secs: u32,
}

impl TimeOfDay {
    /// Create a time of day from components. The hour wraps modulo 24.
    ///
    /// # Errors
    ///
    /// Returns `Err` if minutes or seconds are out of range.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<Self, TimeError> {
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }
        Ok(Self {
            secs: (hour % 24) * 3600 + minute * 60 + second,
        })
    }

    /// Parse a GTFS "HH:MM:SS" time string.
    ///
    /// Hours may be a single digit and may exceed 23; trips running past
    /// midnight wrap onto the next schedule day.
    ///
    /// # Errors
    ///
    /// Returns `Err` on malformed input.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::domain::TimeOfDay;
    ///
    /// assert!(TimeOfDay::parse("09:05:00").is_ok());
    /// assert!(TimeOfDay::parse("9:05:00").is_ok());
    /// assert!(TimeOfDay::parse("24:00:00").is_ok());
    /// assert!(TimeOfDay::parse("09:05").is_err());
    /// assert!(TimeOfDay::parse("09:65:00").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');
        let (hour, minute, second) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(h), Some(m), Some(sec), None) => (h, m, sec),
            _ => return Err(TimeError::new("expected HH:MM:SS format")),
        };

        let hour: u32 = hour
            .parse()
            .map_err(|_| TimeError::new("invalid hour digits"))?;
        if minute.len() != 2 || second.len() != 2 {
            return Err(TimeError::new("minutes and seconds must be two digits"));
        }
        let minute: u32 = minute
            .parse()
            .map_err(|_| TimeError::new("invalid minute digits"))?;
        let second: u32 = second
            .parse()
            .map_err(|_| TimeError::new("invalid second digits"))?;

        Self::from_hms(hour, minute, second)
    }

    /// Seconds elapsed since midnight.
    pub fn seconds_from_midnight(&self) -> u32 {
        self.secs
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.secs / 3600
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        (self.secs / 60) % 60
    }

    /// Returns the second (0-59).
    pub fn second(&self) -> u32 {
        self.secs % 60
    }

    /// Seconds from this time of day forward to `other`, wrapping past
    /// midnight.
    ///
    /// The result is always in `0..86400`; a target earlier in the day is
    /// taken to be on the following day.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::domain::TimeOfDay;
    ///
    /// let late = TimeOfDay::parse("23:50:00").unwrap();
    /// let early = TimeOfDay::parse("00:10:00").unwrap();
    /// assert_eq!(late.seconds_until(early), 20 * 60);
    /// assert_eq!(early.seconds_until(early), 0);
    /// ```
    pub fn seconds_until(&self, other: TimeOfDay) -> i64 {
        let delta = other.secs as i64 - self.secs as i64;
        delta.rem_euclid(SECS_PER_DAY as i64)
    }
}

impl fmt::Debug for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeOfDay({self})")
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

/// A date-aware instant during a planned journey.
///
/// Search states need a full timestamp rather than a time of day because a
/// journey can cross midnight. The date component is seeded from the
/// request's departure timestamp.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitTime(NaiveDateTime);

impl TransitTime {
    /// Wraps a naive timestamp.
    pub fn new(datetime: NaiveDateTime) -> Self {
        Self(datetime)
    }

    /// Returns the underlying timestamp.
    pub fn to_datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// Returns the time-of-day component.
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay {
            secs: self.0.time().num_seconds_from_midnight(),
        }
    }

    /// The next instant at or after `self` whose time of day is `target`.
    ///
    /// Advancing to a time of day earlier than the current one lands on the
    /// following day.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use transit_server::domain::{TimeOfDay, TransitTime};
    ///
    /// let now = TransitTime::new(
    ///     NaiveDate::from_ymd_opt(2025, 11, 16)
    ///         .unwrap()
    ///         .and_hms_opt(23, 50, 0)
    ///         .unwrap(),
    /// );
    /// let next = now.advance_to(TimeOfDay::parse("00:10:00").unwrap());
    /// assert_eq!(next.to_datetime().to_string(), "2025-11-17 00:10:00");
    /// ```
    pub fn advance_to(&self, target: TimeOfDay) -> TransitTime {
        *self + Duration::seconds(self.time_of_day().seconds_until(target))
    }

    /// Returns the duration between two instants.
    ///
    /// Negative if `other` is after `self`.
    pub fn signed_duration_since(&self, other: TransitTime) -> Duration {
        self.0.signed_duration_since(other.0)
    }
}

impl Add<Duration> for TransitTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl fmt::Debug for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitTime({})", self.0)
    }
}

impl fmt::Display for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn instant(h: u32, m: u32, s: u32) -> TransitTime {
        TransitTime::new(
            NaiveDate::from_ymd_opt(2025, 11, 16)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap(),
        )
    }

    #[test]
    fn parse_plain_time() {
        let t = TimeOfDay::parse("09:05:30").unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (9, 5, 30));
    }

    #[test]
    fn parse_wraps_hours_past_midnight() {
        // "25:10:00" is stored as 01:10:00; the date is supplied by the
        // search's starting timestamp.
        let t = TimeOfDay::parse("25:10:00").unwrap();
        assert_eq!(t, TimeOfDay::from_hms(1, 10, 0).unwrap());
        assert_eq!(t.to_string(), "01:10:00");

        let t = TimeOfDay::parse("24:00:00").unwrap();
        assert_eq!(t.seconds_from_midnight(), 0);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(TimeOfDay::parse("").is_err());
        assert!(TimeOfDay::parse("12:34").is_err());
        assert!(TimeOfDay::parse("12:34:56:78").is_err());
        assert!(TimeOfDay::parse("ab:cd:ef").is_err());
        assert!(TimeOfDay::parse("12:60:00").is_err());
        assert!(TimeOfDay::parse("12:00:60").is_err());
        assert!(TimeOfDay::parse("12:3:00").is_err());
    }

    #[test]
    fn seconds_until_same_day() {
        let depart = TimeOfDay::parse("09:00:00").unwrap();
        let arrive = TimeOfDay::parse("09:05:00").unwrap();
        assert_eq!(depart.seconds_until(arrive), 300);
    }

    #[test]
    fn seconds_until_wraps_midnight() {
        let depart = TimeOfDay::parse("23:59:00").unwrap();
        let arrive = TimeOfDay::parse("00:01:00").unwrap();
        assert_eq!(depart.seconds_until(arrive), 120);
    }

    #[test]
    fn advance_to_later_today() {
        let now = instant(8, 55, 0);
        let next = now.advance_to(TimeOfDay::parse("09:00:00").unwrap());
        assert_eq!(next, instant(9, 0, 0));
    }

    #[test]
    fn advance_to_crosses_midnight() {
        let now = instant(23, 30, 0);
        let next = now.advance_to(TimeOfDay::parse("01:10:00").unwrap());
        assert_eq!(
            next.to_datetime(),
            NaiveDate::from_ymd_opt(2025, 11, 17)
                .unwrap()
                .and_hms_opt(1, 10, 0)
                .unwrap()
        );
    }

    #[test]
    fn transit_time_ordering() {
        assert!(instant(9, 0, 0) < instant(9, 0, 1));
        assert_eq!(
            instant(9, 0, 1).signed_duration_since(instant(9, 0, 0)),
            Duration::seconds(1)
        );
    }
}
