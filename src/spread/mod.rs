//! Spread tracking module
//!
//! Ratio of the two instruments' mid prices over a bounded rolling window

mod tracker;
mod types;

pub use tracker::{SpreadTracker, DEFAULT_MIN_SAMPLES, DEFAULT_WINDOW};
pub use types::{DataError, SpreadSample, SpreadStatistics};
