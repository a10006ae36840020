// Model constants
pub const K_FACTOR: f64 = 20.0;
// Rating-difference scale in the logistic Elo expectation
pub const RATING_SCALE: f64 = 400.0;
pub const DEFAULT_RATING: f64 = 1000.0;
pub const ABSOLUTE_RATING_FLOOR: f64 = 100.0;
