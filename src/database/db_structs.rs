use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One unrated result row as it comes off the storage join, before integrity
/// checks. The participation side is always present; the event/driver side is
/// optional because the join may fail to resolve (see `timeline::validate_rows`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawResultRow {
    pub participation_id: String,
    pub laps_completed: i32,
    pub finish_time: f64,
    pub last_checkpoint: i32,
    pub event_id: Option<String>,
    pub driver_id: Option<String>,
    pub event_time: Option<DateTime<FixedOffset>>
}

/// A fully resolved participation: the unit the engine ranks and rates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaceResultRow {
    pub participation_id: String,
    pub event_id: String,
    pub driver_id: String,
    pub event_time: DateTime<FixedOffset>,
    pub laps_completed: i32,
    pub finish_time: f64,
    pub last_checkpoint: i32
}

/// Persisted rating tuple, uniquely keyed by participation id. Re-deriving
/// the same participation overwrites the existing record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub participation_id: String,
    pub rating: f64,
    pub delta: f64
}
