use crate::{
    database::{
        db_structs::{RaceResultRow, RatingRecord, RawResultRow},
        store::ResultStore
    },
    error::ProcessorError,
    model::{snapshot::RatingSnapshot, structures::scope::RatingScope}
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        RwLock
    }
};

/// Fixed base timestamp plus an hour offset, so tests control chronology
/// without caring about absolute dates.
pub fn event_time(hour_offset: i64) -> DateTime<FixedOffset> {
    (Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::hours(hour_offset)).fixed_offset()
}

pub fn generate_result_row(
    participation_id: &str,
    event_id: &str,
    driver_id: &str,
    event_time: DateTime<FixedOffset>,
    laps_completed: i32,
    finish_time: f64,
    last_checkpoint: i32
) -> RaceResultRow {
    RaceResultRow {
        participation_id: participation_id.to_string(),
        event_id: event_id.to_string(),
        driver_id: driver_id.to_string(),
        event_time,
        laps_completed,
        finish_time,
        last_checkpoint
    }
}

/// Raw join output with fixed ranking fields; None on the event/driver side
/// models a failed join.
pub fn generate_raw_row(
    participation_id: &str,
    event_id: Option<&str>,
    driver_id: Option<&str>,
    event_time: Option<DateTime<FixedOffset>>
) -> RawResultRow {
    RawResultRow {
        participation_id: participation_id.to_string(),
        laps_completed: 10,
        finish_time: 600.0,
        last_checkpoint: 4,
        event_id: event_id.map(str::to_string),
        driver_id: driver_id.map(str::to_string),
        event_time
    }
}

pub fn raw_from(row: &RaceResultRow) -> RawResultRow {
    RawResultRow {
        participation_id: row.participation_id.clone(),
        laps_completed: row.laps_completed,
        finish_time: row.finish_time,
        last_checkpoint: row.last_checkpoint,
        event_id: Some(row.event_id.clone()),
        driver_id: Some(row.driver_id.clone()),
        event_time: Some(row.event_time)
    }
}

pub fn snapshot_with(ratings: &[(&str, f64)]) -> RatingSnapshot {
    let mut snapshot = RatingSnapshot::new();
    for (driver_id, rating) in ratings {
        snapshot.insert_or_update(driver_id, *rating);
    }

    snapshot
}

/// In-memory `ResultStore` for driving the batch pipeline in tests. Records
/// are upserted into a map keyed by participation id, mirroring the primary
/// key of the real write table. `begin` snapshots the record map so
/// `rollback` can restore it; `fail_next_upsert` injects a storage fault.
#[derive(Default)]
pub struct InMemoryResultStore {
    latest_ratings: RwLock<HashMap<String, f64>>,
    unrated: RwLock<Vec<RawResultRow>>,
    records: RwLock<HashMap<String, RatingRecord>>,
    saved_records: RwLock<Option<HashMap<String, RatingRecord>>>,
    tables_ready: AtomicBool,
    fail_next_upsert: AtomicBool
}

impl InMemoryResultStore {
    pub fn new() -> InMemoryResultStore {
        InMemoryResultStore::default()
    }

    pub fn with_unrated(rows: Vec<RawResultRow>) -> InMemoryResultStore {
        let store = InMemoryResultStore::new();
        *store.unrated.write().unwrap() = rows;
        store
    }

    pub fn seed_rating(&self, driver_id: &str, rating: f64) {
        self.latest_ratings.write().unwrap().insert(driver_id.to_string(), rating);
    }

    pub fn set_unrated(&self, rows: Vec<RawResultRow>) {
        *self.unrated.write().unwrap() = rows;
    }

    pub fn fail_next_upsert(&self) {
        self.fail_next_upsert.store(true, Ordering::SeqCst);
    }

    pub fn record(&self, participation_id: &str) -> Option<RatingRecord> {
        self.records.read().unwrap().get(participation_id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn tables_ready(&self) -> bool {
        self.tables_ready.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn ensure_rating_tables(&self, _scope: RatingScope) -> Result<(), ProcessorError> {
        self.tables_ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_latest_ratings(&self, _scope: RatingScope) -> Result<HashMap<String, f64>, ProcessorError> {
        Ok(self.latest_ratings.read().unwrap().clone())
    }

    async fn get_unrated_results(&self, _scope: RatingScope) -> Result<Vec<RawResultRow>, ProcessorError> {
        Ok(self.unrated.read().unwrap().clone())
    }

    async fn upsert_rating_records(
        &self,
        _scope: RatingScope,
        records: &[RatingRecord]
    ) -> Result<u64, ProcessorError> {
        if self.fail_next_upsert.swap(false, Ordering::SeqCst) {
            return Err(ProcessorError::Storage("injected upsert failure".to_string()));
        }

        let mut stored = self.records.write().unwrap();
        for record in records {
            stored.insert(record.participation_id.clone(), record.clone());
        }

        Ok(records.len() as u64)
    }

    async fn begin(&self) -> Result<(), ProcessorError> {
        let current = self.records.read().unwrap().clone();
        *self.saved_records.write().unwrap() = Some(current);
        Ok(())
    }

    async fn commit(&self) -> Result<(), ProcessorError> {
        *self.saved_records.write().unwrap() = None;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), ProcessorError> {
        if let Some(saved) = self.saved_records.write().unwrap().take() {
            *self.records.write().unwrap() = saved;
        }

        Ok(())
    }
}
