//! Configuration types for pairs-guard

use crate::risk::GuardRailConfig;
use crate::spread::{DEFAULT_MIN_SAMPLES, DEFAULT_WINDOW};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use thiserror::Error;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pair: PairConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub guard_rail: GuardRailConfig,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// The two traded instruments
#[derive(Debug, Clone, Deserialize)]
pub struct PairConfig {
    pub instrument_a: String,
    pub instrument_b: String,
    /// Label used in signals and logs, `A-B` when absent
    #[serde(default)]
    pub pair_id: Option<String>,
}

impl PairConfig {
    pub fn new(instrument_a: impl Into<String>, instrument_b: impl Into<String>) -> Self {
        Self {
            instrument_a: instrument_a.into(),
            instrument_b: instrument_b.into(),
            pair_id: None,
        }
    }

    pub fn pair_id(&self) -> String {
        self.pair_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.instrument_a, self.instrument_b))
    }
}

/// Rolling spread window
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Samples kept in the window
    #[serde(default = "default_window")]
    pub window: usize,
    /// Samples needed before statistics are published
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}
fn default_min_samples() -> usize {
    DEFAULT_MIN_SAMPLES
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

/// Paper gateway used by the replay command
#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,
    /// Fee as a fraction of notional
    #[serde(default)]
    pub fee_rate: Decimal,
}

fn default_initial_cash() -> Decimal {
    dec!(10000)
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
            fee_rate: Decimal::ZERO,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus exporter port, disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Semantically invalid configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Instrument A and B are both {0}")]
    SameInstrument(String),
    #[error("Exit multiplier {exit} must be below entry multiplier {entry}")]
    ExitNotBelowEntry { entry: Decimal, exit: Decimal },
    #[error("min_samples {min_samples} must be between 2 and window {window}")]
    InvalidWindow { window: usize, min_samples: usize },
    #[error("No max_acceptable_spread configured for {0}")]
    MissingMaxSpread(String),
    #[error("{0} must be positive")]
    NonPositive(&'static str),
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check relations between fields that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pair = &self.pair;
        if pair.instrument_a == pair.instrument_b {
            return Err(ConfigError::SameInstrument(pair.instrument_a.clone()));
        }

        let tracker = &self.tracker;
        if tracker.min_samples < 2 || tracker.min_samples > tracker.window {
            return Err(ConfigError::InvalidWindow {
                window: tracker.window,
                min_samples: tracker.min_samples,
            });
        }

        let rails = &self.guard_rail;
        if rails.exit_stdev_multiplier >= rails.entry_stdev_multiplier {
            return Err(ConfigError::ExitNotBelowEntry {
                entry: rails.entry_stdev_multiplier,
                exit: rails.exit_stdev_multiplier,
            });
        }
        if rails.max_position_size == 0 {
            return Err(ConfigError::NonPositive("max_position_size"));
        }
        if rails.effective_position_limit() <= 0 {
            return Err(ConfigError::NonPositive("position_limit - position_buffer"));
        }

        for instrument in [&pair.instrument_a, &pair.instrument_b] {
            if rails.max_spread_for(instrument).is_none() {
                return Err(ConfigError::MissingMaxSpread(instrument.clone()));
            }
        }

        Ok(())
    }
}
