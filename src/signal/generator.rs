//! Mean-reversion signal generation

use super::{Bands, Signal, SignalDetail, SignalParams};
use crate::risk::{GuardRailConfig, PairPosition};
use crate::spread::SpreadStatistics;
use rust_decimal::Decimal;

/// Maps the current spread and statistics to at most one signal.
///
/// Stateless: the caller supplies the current position on every call.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    pair_id: String,
    entry_multiplier: Decimal,
    exit_multiplier: Decimal,
    theoretical_parity: Option<Decimal>,
    target_volume: u64,
}

impl SignalGenerator {
    /// Create a generator from guard-rail thresholds
    pub fn new(pair_id: impl Into<String>, config: &GuardRailConfig) -> Self {
        Self {
            pair_id: pair_id.into(),
            entry_multiplier: config.entry_stdev_multiplier,
            exit_multiplier: config.exit_stdev_multiplier,
            theoretical_parity: config.theoretical_parity,
            target_volume: config.max_position_size,
        }
    }

    /// Compute entry and exit bands.
    ///
    /// The centre is the configured parity when set, otherwise the
    /// empirical mean.
    pub fn bands(&self, stats: &SpreadStatistics) -> Bands {
        let effective_mean = self.theoretical_parity.unwrap_or(stats.mean);
        let entry = self.entry_multiplier * stats.std_dev;
        let exit = self.exit_multiplier * stats.std_dev;

        Bands {
            effective_mean,
            upper_entry: effective_mean + entry,
            lower_entry: effective_mean - entry,
            upper_exit: effective_mean + exit,
            lower_exit: effective_mean - exit,
        }
    }

    /// Evaluate one tick. Exit checks run before entry checks.
    pub fn generate(
        &self,
        spread: Decimal,
        stats: &SpreadStatistics,
        position: PairPosition,
    ) -> Signal {
        let bands = self.bands(stats);

        match position {
            PairPosition::ShortPair if spread <= bands.upper_exit => {
                Signal::ClosePosition(self.detail(
                    format!("spread={spread} <= upper_exit={} (reverted)", bands.upper_exit),
                    spread,
                    bands.upper_exit,
                    0,
                ))
            }
            PairPosition::LongPair if spread >= bands.lower_exit => {
                Signal::ClosePosition(self.detail(
                    format!("spread={spread} >= lower_exit={} (reverted)", bands.lower_exit),
                    spread,
                    bands.lower_exit,
                    0,
                ))
            }
            PairPosition::Flat if spread > bands.upper_entry => {
                Signal::OpenShortPair(self.detail(
                    format!("spread={spread} > upper_entry={}", bands.upper_entry),
                    spread,
                    bands.upper_entry,
                    self.target_volume,
                ))
            }
            PairPosition::Flat if spread < bands.lower_entry => {
                Signal::OpenLongPair(self.detail(
                    format!("spread={spread} < lower_entry={}", bands.lower_entry),
                    spread,
                    bands.lower_entry,
                    self.target_volume,
                ))
            }
            _ => Signal::None,
        }
    }

    fn detail(
        &self,
        reason: String,
        spread: Decimal,
        threshold: Decimal,
        target_volume: u64,
    ) -> SignalDetail {
        SignalDetail {
            reason,
            params: SignalParams {
                pair_id: self.pair_id.clone(),
                target_volume,
            },
            spread,
            threshold,
        }
    }
}
