//! ActivitySession - controller output
//!
//! The finished record handed to the persistence boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{RoutePoint, TrackerError};

/// Kind of activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Bike,
    #[default]
    Run,
    Walk,
    Hike,
    Paddleboard,
    Climb,
    Other,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 7] = [
        Self::Bike,
        Self::Run,
        Self::Walk,
        Self::Hike,
        Self::Paddleboard,
        Self::Climb,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bike => "bike",
            Self::Run => "run",
            Self::Walk => "walk",
            Self::Hike => "hike",
            Self::Paddleboard => "paddleboard",
            Self::Climb => "climb",
            Self::Other => "other",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Bike => "Ride",
            Self::Run => "Run",
            Self::Walk => "Walk",
            Self::Hike => "Hike",
            Self::Paddleboard => "Paddle",
            Self::Climb => "Climb",
            Self::Other => "Activity",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| TrackerError::Other(format!("unknown activity kind: {s}")))
    }
}

/// Identifier assigned by the remote store
pub type RecordId = String;

/// Finished activity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySession {
    pub id: String,
    pub kind: ActivityKind,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Civil date used for grouping
    pub activity_date: NaiveDate,
    /// Active (non-paused) seconds
    pub duration_s: u64,
    pub distance_m: f64,
    pub route: Vec<RoutePoint>,
    pub average_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub notes: String,
    pub photos: Vec<String>,
    pub manual_entry: bool,
}

impl ActivitySession {
    /// Stable identifier derived from kind and start instant
    pub fn make_id(kind: ActivityKind, start_time: DateTime<Utc>) -> String {
        format!("{}-{}", kind, start_time.format("%Y%m%dT%H%M%S%3fZ"))
    }

    /// Name used when the caller leaves it blank
    pub fn default_name(kind: ActivityKind, date: NaiveDate) -> String {
        format!("{} on {}", kind.title(), date.format("%Y-%m-%d"))
    }

    /// Average speed (km/h) for the given distance and active duration
    pub fn average_speed(distance_m: f64, duration_s: u64) -> f64 {
        if duration_s == 0 {
            0.0
        } else {
            distance_m / duration_s as f64 * 3.6
        }
    }

    /// Build a manually entered session
    pub fn manual(entry: ManualEntry) -> Result<Self, TrackerError> {
        let start_time = entry.start_time;
        let end_time = i64::try_from(entry.duration_s)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .and_then(|span| start_time.checked_add_signed(span))
            .ok_or_else(|| {
                TrackerError::invalid_session(
                    "duration_s",
                    format!("{}s does not fit after the start time", entry.duration_s),
                )
            })?;
        let activity_date = entry
            .activity_date
            .unwrap_or_else(|| start_time.with_timezone(&Local).date_naive());
        let name = if entry.name.trim().is_empty() {
            Self::default_name(entry.kind, activity_date)
        } else {
            entry.name
        };
        let average_speed_kmh = Self::average_speed(entry.distance_m, entry.duration_s);

        let session = Self {
            id: Self::make_id(entry.kind, start_time),
            kind: entry.kind,
            name,
            start_time,
            end_time,
            activity_date,
            duration_s: entry.duration_s,
            distance_m: entry.distance_m,
            route: Vec::new(),
            average_speed_kmh,
            max_speed_kmh: average_speed_kmh,
            notes: entry.notes,
            photos: entry.photos,
            manual_entry: true,
        };
        session.validate()?;
        Ok(session)
    }

    /// Check record invariants
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.end_time < self.start_time {
            return Err(TrackerError::invalid_session(
                "end_time",
                "end_time is before start_time",
            ));
        }
        for (field, value) in [
            ("distance_m", self.distance_m),
            ("average_speed_kmh", self.average_speed_kmh),
            ("max_speed_kmh", self.max_speed_kmh),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackerError::invalid_session(
                    field,
                    format!("must be finite and >= 0, got {value}"),
                ));
            }
        }
        if self.manual_entry && !self.route.is_empty() {
            return Err(TrackerError::invalid_session(
                "route",
                "manual entries carry no route",
            ));
        }
        if let Some(idx) = self
            .route
            .windows(2)
            .position(|w| w[1].timestamp_ms < w[0].timestamp_ms)
        {
            return Err(TrackerError::invalid_session(
                format!("route[{}]", idx + 1),
                "timestamps must be non-decreasing",
            ));
        }
        Ok(())
    }
}

/// Caller-provided fields for a manually entered activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualEntry {
    pub kind: ActivityKind,
    #[serde(default)]
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub duration_s: u64,
    pub distance_m: f64,
    #[serde(default)]
    pub activity_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Caller edits applied when a tracked session stops
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopRequest {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    /// Overrides the civil date derived from the start instant
    #[serde(default)]
    pub activity_date: Option<NaiveDate>,
}

impl StopRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Session queued locally after the remote write failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub session: ActivitySession,
    pub queued_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: String,
}

impl PendingWrite {
    pub fn new(session: ActivitySession, last_error: impl Into<String>) -> Self {
        Self {
            session,
            queued_at: Utc::now(),
            attempts: 1,
            last_error: last_error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry() -> ManualEntry {
        ManualEntry {
            kind: ActivityKind::Hike,
            name: String::new(),
            start_time: Utc.with_ymd_and_hms(2024, 5, 4, 9, 0, 0).unwrap(),
            duration_s: 3_600,
            distance_m: 5_000.0,
            activity_date: NaiveDate::from_ymd_opt(2024, 5, 4),
            notes: "ridge loop".into(),
            photos: vec![],
        }
    }

    #[test]
    fn test_kind_parse_and_display() {
        for kind in ActivityKind::ALL {
            assert_eq!(kind.to_string().parse::<ActivityKind>().unwrap(), kind);
        }
        assert_eq!("BIKE".parse::<ActivityKind>().unwrap(), ActivityKind::Bike);
        assert!("skydive".parse::<ActivityKind>().is_err());
    }

    #[test]
    fn test_kind_serde_snake_case() {
        let json = serde_json::to_string(&ActivityKind::Paddleboard).unwrap();
        assert_eq!(json, "\"paddleboard\"");
    }

    #[test]
    fn test_manual_session() {
        let session = ActivitySession::manual(entry()).unwrap();
        assert!(session.manual_entry);
        assert!(session.route.is_empty());
        assert_eq!(session.name, "Hike on 2024-05-04");
        assert!((session.average_speed_kmh - 5.0).abs() < 1e-9);
        assert_eq!(
            session.end_time - session.start_time,
            chrono::Duration::seconds(3_600)
        );
    }

    #[test]
    fn test_manual_rejects_negative_distance() {
        let mut e = entry();
        e.distance_m = -1.0;
        let err = ActivitySession::manual(e).unwrap_err();
        assert!(err.to_string().contains("distance_m"), "got: {err}");
    }

    #[test]
    fn test_manual_rejects_unrepresentable_duration() {
        for duration_s in [10_000_000_000_000, u64::MAX] {
            let mut e = entry();
            e.duration_s = duration_s;
            let err = ActivitySession::manual(e).unwrap_err();
            assert!(
                matches!(&err, TrackerError::InvalidSession { field, .. } if field == "duration_s"),
                "got: {err}"
            );
        }
    }

    #[test]
    fn test_average_speed_zero_duration() {
        assert_eq!(ActivitySession::average_speed(500.0, 0), 0.0);
        assert!((ActivitySession::average_speed(1_000.0, 360) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_route_order() {
        let mut session = ActivitySession::manual(entry()).unwrap();
        session.manual_entry = false;
        let p = |t| RoutePoint {
            latitude: 0.0,
            longitude: 0.0,
            timestamp_ms: t,
            altitude: None,
            accuracy_m: None,
        };
        session.route = vec![p(10), p(5)];
        let err = session.validate().unwrap_err();
        assert!(err.to_string().contains("route[1]"), "got: {err}");
    }
}
