use crate::model::constants::DEFAULT_RATING;
use std::collections::HashMap;

/// Rolling per-driver rating state for one scope run. Reflects exactly the
/// events applied so far, in timestamp order; it lives for the duration of a
/// single batch and is discarded afterward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingSnapshot {
    ratings: HashMap<String, f64>
}

impl RatingSnapshot {
    pub fn new() -> RatingSnapshot {
        RatingSnapshot {
            ratings: HashMap::new()
        }
    }

    pub fn from_map(ratings: HashMap<String, f64>) -> RatingSnapshot {
        RatingSnapshot { ratings }
    }

    /// Current rating for a driver, defaulting to 1000.0 for drivers that
    /// have never been rated in this scope.
    pub fn rating_of(&self, driver_id: &str) -> f64 {
        self.ratings.get(driver_id).copied().unwrap_or(DEFAULT_RATING)
    }

    /// True only if the driver has an explicit rating (prior or computed
    /// earlier in this batch).
    pub fn contains(&self, driver_id: &str) -> bool {
        self.ratings.contains_key(driver_id)
    }

    pub fn insert_or_update(&mut self, driver_id: &str, rating: f64) {
        self.ratings.insert(driver_id.to_string(), rating);
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}
