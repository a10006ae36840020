use crate::{
    database::db_structs::{RatingRecord, RawResultRow},
    error::ProcessorError,
    model::structures::scope::RatingScope
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Storage boundary for one batch run. `DbClient` is the production
/// implementation; tests drive the pipeline through an in-memory one.
///
/// A run brackets the snapshot read and all record writes between `begin` and
/// `commit` so a concurrent reader never observes a partially applied batch.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Creates the scope's read and write rating tables if they do not exist.
    async fn ensure_rating_tables(&self, scope: RatingScope) -> Result<(), ProcessorError>;

    /// Most recent known rating per driver for the scope. Drivers with no
    /// prior rating are absent; callers default them to 1000.0.
    async fn get_latest_ratings(&self, scope: RatingScope) -> Result<HashMap<String, f64>, ProcessorError>;

    /// All not-yet-rated result rows for the scope, joined with their
    /// participation and event. No ordering is guaranteed.
    async fn get_unrated_results(&self, scope: RatingScope) -> Result<Vec<RawResultRow>, ProcessorError>;

    /// Inserts or overwrites records keyed by participation id. Returns the
    /// number of rows written. An empty batch writes nothing.
    async fn upsert_rating_records(&self, scope: RatingScope, records: &[RatingRecord])
        -> Result<u64, ProcessorError>;

    async fn begin(&self) -> Result<(), ProcessorError>;

    async fn commit(&self) -> Result<(), ProcessorError>;

    async fn rollback(&self) -> Result<(), ProcessorError>;
}
