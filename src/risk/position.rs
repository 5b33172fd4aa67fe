//! Pair position tracking

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Direction of an open pair trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PairSide {
    /// Long A, short B
    LongPair,
    /// Short A, long B
    ShortPair,
}

/// The engine's belief about its pair position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PairPosition {
    #[default]
    Flat,
    LongPair,
    ShortPair,
}

impl From<PairSide> for PairPosition {
    fn from(side: PairSide) -> Self {
        match side {
            PairSide::LongPair => PairPosition::LongPair,
            PairSide::ShortPair => PairPosition::ShortPair,
        }
    }
}

impl fmt::Display for PairPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairPosition::Flat => write!(f, "FLAT"),
            PairPosition::LongPair => write!(f, "LONG_PAIR"),
            PairPosition::ShortPair => write!(f, "SHORT_PAIR"),
        }
    }
}

/// Illegal state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// `open` called while a pair is already held
    #[error("Cannot open {requested:?}: already holding {current}")]
    AlreadyOpen {
        current: PairPosition,
        requested: PairSide,
    },
}

/// Position state owned by the engine.
///
/// Fields are private: `open` and `close` are the only mutators, and
/// `adopted` builds a fresh value for startup reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionState {
    position: PairPosition,
    entry_spread: Option<Decimal>,
    entry_prices: HashMap<String, Decimal>,
    opened_at: Option<DateTime<Utc>>,
    trade_count: u64,
}

impl PositionState {
    /// Create a flat state with no trades
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat state continuing an earlier trade count
    pub fn with_trade_count(trade_count: u64) -> Self {
        Self {
            trade_count,
            ..Self::default()
        }
    }

    /// State for a position found on the exchange at (re)seed time.
    ///
    /// The original entry spread is unknowable, so the caller passes the
    /// currently observed spread and mids. Adoption is not an entry and
    /// leaves `trade_count` as given.
    pub fn adopted(
        side: PairSide,
        spread: Decimal,
        prices: HashMap<String, Decimal>,
        trade_count: u64,
    ) -> Self {
        Self {
            position: side.into(),
            entry_spread: Some(spread),
            entry_prices: prices,
            opened_at: Some(Utc::now()),
            trade_count,
        }
    }

    /// Record an executed pair entry
    pub fn open(
        &mut self,
        side: PairSide,
        spread: Decimal,
        prices: HashMap<String, Decimal>,
    ) -> Result<(), TransitionError> {
        if self.position != PairPosition::Flat {
            return Err(TransitionError::AlreadyOpen {
                current: self.position,
                requested: side,
            });
        }

        self.position = side.into();
        self.entry_spread = Some(spread);
        self.entry_prices = prices;
        self.opened_at = Some(Utc::now());
        self.trade_count += 1;
        Ok(())
    }

    /// Return to flat, clearing entry fields. Trade count is unchanged.
    pub fn close(&mut self) {
        self.position = PairPosition::Flat;
        self.entry_spread = None;
        self.entry_prices.clear();
        self.opened_at = None;
    }

    pub fn position(&self) -> PairPosition {
        self.position
    }

    pub fn is_flat(&self) -> bool {
        self.position == PairPosition::Flat
    }

    pub fn entry_spread(&self) -> Option<Decimal> {
        self.entry_spread
    }

    pub fn entry_prices(&self) -> &HashMap<String, Decimal> {
        &self.entry_prices
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    /// Number of pair entries since the engine started
    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }
}
