//! Risk management types

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Why the guard rail refused a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Kill switch is off
    TradingDisabled,
    /// Open requested while a pair is held
    AlreadyInPosition,
    /// Close requested while flat
    NoPosition,
    /// Cash below the margin an open needs
    InsufficientMargin,
    /// A leg would breach the position limit
    PositionLimit,
    /// Too little volume at the execution price
    VolumeLocked,
    /// Bid-ask spread too wide, or no tolerance configured
    SlippageRiskHigh,
    /// Execution-price spread no longer clears the band
    FrontRunOrSlipped,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::TradingDisabled => "trading_disabled",
            RejectReason::AlreadyInPosition => "already_in_position",
            RejectReason::NoPosition => "no_position",
            RejectReason::InsufficientMargin => "insufficient_margin",
            RejectReason::PositionLimit => "position_limit",
            RejectReason::VolumeLocked => "volume_locked",
            RejectReason::SlippageRiskHigh => "slippage_risk_high",
            RejectReason::FrontRunOrSlipped => "front_run_or_slipped",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected signal with the values that failed the check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub reason: RejectReason,
    /// Instrument the check failed on, for per-leg checks
    pub instrument: Option<String>,
    pub observed: Option<Decimal>,
    pub limit: Option<Decimal>,
}

impl Rejection {
    pub fn new(reason: RejectReason) -> Self {
        Self {
            reason,
            instrument: None,
            observed: None,
            limit: None,
        }
    }

    pub fn on(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }

    pub fn values(mut self, observed: Decimal, limit: Decimal) -> Self {
        self.observed = Some(observed);
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)?;
        if let Some(instrument) = &self.instrument {
            write!(f, " on {instrument}")?;
        }
        match (self.observed, self.limit) {
            (Some(observed), Some(limit)) => write!(f, " (observed={observed}, limit={limit})"),
            (Some(observed), None) => write!(f, " (observed={observed})"),
            _ => Ok(()),
        }
    }
}
