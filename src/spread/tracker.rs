//! Rolling spread tracker
//!
//! Keeps the last `capacity` spread samples and recomputes mean and sample
//! standard deviation (ddof = 1) once `min_samples` observations are held.

use super::{DataError, SpreadSample, SpreadStatistics};
use crate::orderbook::Quote;
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::VecDeque;

/// Default window length
pub const DEFAULT_WINDOW: usize = 100;
/// Default number of samples before statistics are published
pub const DEFAULT_MIN_SAMPLES: usize = 20;

/// Bounded FIFO window of spread samples with running statistics
#[derive(Debug, Clone)]
pub struct SpreadTracker {
    capacity: usize,
    min_samples: usize,
    window: VecDeque<Decimal>,
    last: Option<SpreadSample>,
    stats: Option<SpreadStatistics>,
}

impl SpreadTracker {
    /// Create a tracker holding at most `capacity` samples
    pub fn new(capacity: usize, min_samples: usize) -> Self {
        Self {
            capacity,
            // Sample stdev needs two points
            min_samples: min_samples.max(2),
            window: VecDeque::with_capacity(capacity),
            last: None,
            stats: None,
        }
    }

    /// Record a new tick.
    ///
    /// Fails without touching the window when either book is one-sided.
    pub fn update(&mut self, quote_a: &Quote, quote_b: &Quote) -> Result<SpreadSample, DataError> {
        let sample = SpreadSample::from_quotes(quote_a, quote_b)?;

        self.window.push_back(sample.value);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
        self.last = Some(sample);
        self.stats = self.compute_statistics();

        tracing::debug!(
            spread = %sample.value,
            samples = self.window.len(),
            ready = self.stats.is_some(),
            "Spread updated"
        );

        Ok(sample)
    }

    fn compute_statistics(&self) -> Option<SpreadStatistics> {
        let len = self.window.len();
        if len < self.min_samples {
            return None;
        }

        let n = Decimal::from(len);
        let mean = self.window.iter().sum::<Decimal>() / n;
        let squared: Decimal = self.window.iter().map(|x| (*x - mean) * (*x - mean)).sum();
        let variance = squared / (n - Decimal::ONE);
        let std_dev = variance.sqrt()?;

        Some(SpreadStatistics { mean, std_dev })
    }

    /// Statistics are published once the window holds `min_samples` points
    pub fn has_sufficient_data(&self) -> bool {
        self.stats.is_some()
    }

    /// Current statistics, absent while warming up
    pub fn statistics(&self) -> Option<SpreadStatistics> {
        self.stats
    }

    /// Most recent sample
    pub fn last_spread(&self) -> Option<SpreadSample> {
        self.last
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Maximum number of samples held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples required before statistics are published
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }
}

impl Default for SpreadTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MIN_SAMPLES)
    }
}
