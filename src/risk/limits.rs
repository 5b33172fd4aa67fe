//! Guard-rail thresholds

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Thresholds for signal bands and pre-trade checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardRailConfig {
    /// Entry band width in standard deviations
    #[serde(default = "default_entry_stdev")]
    pub entry_stdev_multiplier: Decimal,
    /// Exit band width in standard deviations, below the entry width
    #[serde(default = "default_exit_stdev")]
    pub exit_stdev_multiplier: Decimal,
    /// Volume per leg for every open signal
    #[serde(default = "default_max_position_size")]
    pub max_position_size: u64,
    /// Fraction of the requested volume that must rest at the top of book
    #[serde(default = "default_min_volume_ratio")]
    pub min_volume_ratio: Decimal,
    /// Widest tolerated bid-ask spread, per instrument
    #[serde(default)]
    pub max_acceptable_spread: HashMap<String, Decimal>,
    /// Slack allowed when re-checking the band at execution prices
    #[serde(default = "default_front_run_tolerance")]
    pub front_run_tolerance: Decimal,
    /// Floor on the margin an open requires
    #[serde(default = "default_min_required_margin")]
    pub min_required_margin: Decimal,
    /// Margin charged per unit of volume
    #[serde(default = "default_margin_per_unit")]
    pub margin_per_unit: Decimal,
    /// Fixed centre of the bands, replacing the empirical mean when set
    #[serde(default)]
    pub theoretical_parity: Option<Decimal>,
    /// Absolute per-instrument position limit
    #[serde(default = "default_position_limit")]
    pub position_limit: i64,
    /// Headroom kept below the position limit
    #[serde(default = "default_position_buffer")]
    pub position_buffer: i64,
    /// Global kill switch
    #[serde(default = "default_true")]
    pub trading_enabled: bool,
}

fn default_entry_stdev() -> Decimal {
    dec!(0.8)
}
fn default_exit_stdev() -> Decimal {
    dec!(0.2)
}
fn default_max_position_size() -> u64 {
    10
}
fn default_min_volume_ratio() -> Decimal {
    dec!(0.1)
}
fn default_front_run_tolerance() -> Decimal {
    dec!(0.005)
}
fn default_min_required_margin() -> Decimal {
    dec!(100)
}
fn default_margin_per_unit() -> Decimal {
    dec!(2)
}
fn default_position_limit() -> i64 {
    100
}
fn default_position_buffer() -> i64 {
    5
}
fn default_true() -> bool {
    true
}

impl Default for GuardRailConfig {
    fn default() -> Self {
        Self {
            entry_stdev_multiplier: default_entry_stdev(),
            exit_stdev_multiplier: default_exit_stdev(),
            max_position_size: default_max_position_size(),
            min_volume_ratio: default_min_volume_ratio(),
            max_acceptable_spread: HashMap::new(),
            front_run_tolerance: default_front_run_tolerance(),
            min_required_margin: default_min_required_margin(),
            margin_per_unit: default_margin_per_unit(),
            theoretical_parity: None,
            position_limit: default_position_limit(),
            position_buffer: default_position_buffer(),
            trading_enabled: true,
        }
    }
}

impl GuardRailConfig {
    /// Margin needed to open `volume` units per leg
    pub fn required_margin(&self, volume: u64) -> Decimal {
        (Decimal::from(volume) * self.margin_per_unit).max(self.min_required_margin)
    }

    /// Minimum top-of-book volume for a leg of `volume` units
    pub fn min_available_volume(&self, volume: u64) -> Decimal {
        Decimal::from(volume) * self.min_volume_ratio
    }

    /// Largest absolute position allowed after a fill
    pub fn effective_position_limit(&self) -> i64 {
        self.position_limit - self.position_buffer
    }

    /// Max bid-ask spread for an instrument, if configured
    pub fn max_spread_for(&self, instrument: &str) -> Option<Decimal> {
        self.max_acceptable_spread.get(instrument).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_strategy_constants() {
        let config = GuardRailConfig::default();
        assert_eq!(config.entry_stdev_multiplier, dec!(0.8));
        assert_eq!(config.exit_stdev_multiplier, dec!(0.2));
        assert_eq!(config.max_position_size, 10);
        assert_eq!(config.min_volume_ratio, dec!(0.1));
        assert_eq!(config.front_run_tolerance, dec!(0.005));
        assert!(config.trading_enabled);
        assert!(config.theoretical_parity.is_none());
    }

    #[test]
    fn test_required_margin_has_floor() {
        let config = GuardRailConfig::default();
        // 10 * 2 = 20, below the 100 floor
        assert_eq!(config.required_margin(10), dec!(100));
        assert_eq!(config.required_margin(80), dec!(160));
    }

    #[test]
    fn test_min_available_volume() {
        let config = GuardRailConfig {
            min_volume_ratio: dec!(0.5),
            ..Default::default()
        };
        assert_eq!(config.min_available_volume(10), dec!(5));
    }

    #[test]
    fn test_effective_position_limit() {
        let config = GuardRailConfig::default();
        assert_eq!(config.effective_position_limit(), 95);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            entry_stdev_multiplier = 1.5
            trading_enabled = false

            [max_acceptable_spread]
            PHILLIPS_A = 2.0
        "#;
        let config: GuardRailConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.entry_stdev_multiplier, dec!(1.5));
        assert_eq!(config.exit_stdev_multiplier, dec!(0.2));
        assert!(!config.trading_enabled);
        assert_eq!(config.max_spread_for("PHILLIPS_A"), Some(dec!(2.0)));
        assert_eq!(config.max_spread_for("PHILLIPS_B"), None);
    }
}
