use crate::database::db_structs::RatingRecord;

/// One participant's outcome from rating a single event. `rating_before` is
/// the snapshot value the computation started from; `delta` is re-derived
/// after the floor clamp, so it always equals `rating - rating_before`.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingUpdate {
    pub participation_id: String,
    pub driver_id: String,
    pub rating_before: f64,
    pub rating: f64,
    pub delta: f64
}

impl From<&RatingUpdate> for RatingRecord {
    fn from(update: &RatingUpdate) -> Self {
        RatingRecord {
            participation_id: update.participation_id.clone(),
            rating: update.rating,
            delta: update.delta
        }
    }
}
