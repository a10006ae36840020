pub mod constants;
pub mod elo_model;
pub mod snapshot;
pub mod structures;
pub mod timeline;

use crate::{
    database::{db_structs::RatingRecord, store::ResultStore},
    error::ProcessorError,
    model::{elo_model::EloModel, snapshot::RatingSnapshot, structures::scope::RatingScope}
};
use tracing::{info, warn};

/// Runs one complete batch for a scope: load snapshot, build the event
/// timeline, rate every event in chronological order, persist the records.
/// Returns the number of rating records written.
///
/// The snapshot read and all writes happen inside one transaction; on any
/// failure the transaction is rolled back and nothing is committed. Rerunning
/// is always safe because records are keyed by participation id.
pub async fn process_scope<S: ResultStore + ?Sized>(store: &S, scope: RatingScope) -> Result<u64, ProcessorError> {
    store.begin().await?;

    match run_batch(store, scope).await {
        Ok(written) => {
            store.commit().await?;
            Ok(written)
        }
        Err(e) => {
            if let Err(rollback_err) = store.rollback().await {
                warn!("Rollback failed after batch error: {}", rollback_err);
            }
            Err(e)
        }
    }
}

async fn run_batch<S: ResultStore + ?Sized>(store: &S, scope: RatingScope) -> Result<u64, ProcessorError> {
    store.ensure_rating_tables(scope).await?;

    let snapshot = RatingSnapshot::from_map(store.get_latest_ratings(scope).await?);
    info!("Snapshot loaded: {} drivers with prior ratings", snapshot.len());

    let raw_rows = store.get_unrated_results(scope).await?;
    let timeline = timeline::build_timeline(timeline::validate_rows(raw_rows));
    info!("Timeline built: {} unrated events", timeline.len());

    let mut model = EloModel::new(snapshot);
    let updates = model.process(&timeline);

    let records: Vec<RatingRecord> = updates.iter().map(RatingRecord::from).collect();
    let written = store.upsert_rating_records(scope, &records).await?;

    Ok(written)
}
