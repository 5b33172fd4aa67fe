//! Startup reconciliation of exchange positions

use super::{PairSide, PositionState};
use crate::orderbook::Quote;
use crate::spread::{DataError, SpreadSample};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Existing positions that do not look like a pair trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Existing positions do not form a pair trade: A={pos_a:+}, B={pos_b:+}, delta={delta:+}")]
pub struct AmbiguousPosition {
    pub pos_a: i64,
    pub pos_b: i64,
    pub delta: i64,
}

/// Reconciliation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    /// Operator must confirm before trading begins
    #[error(transparent)]
    Ambiguous(#[from] AmbiguousPosition),
    /// Books were unusable while adopting a position
    #[error("Cannot price adopted position: {0}")]
    Data(#[from] DataError),
    /// `seed` may only be called once
    #[error("Engine already seeded")]
    AlreadySeeded,
}

/// Outcome of classifying observed positions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub pos_a: i64,
    pub pos_b: i64,
    /// Sum of signed positions, ideally zero
    pub delta: i64,
    /// Pair side adopted, `None` when flat
    pub adopted: Option<PairSide>,
    /// Spread recorded as entry reference for an adopted pair
    pub entry_spread: Option<Decimal>,
}

/// Classify signed positions into flat, a pair side, or ambiguous
pub fn classify(pos_a: i64, pos_b: i64) -> Result<Option<PairSide>, AmbiguousPosition> {
    match (pos_a.signum(), pos_b.signum()) {
        (0, 0) => Ok(None),
        (1, -1) => Ok(Some(PairSide::LongPair)),
        (-1, 1) => Ok(Some(PairSide::ShortPair)),
        _ => Err(AmbiguousPosition {
            pos_a,
            pos_b,
            delta: pos_a + pos_b,
        }),
    }
}

/// Build the starting position state from observed exchange positions.
///
/// Instruments missing from `positions` count as zero. Quotes are only
/// read when a pair has to be adopted. `trade_count` carries the entry
/// count of any earlier session.
pub fn reconcile(
    positions: &HashMap<String, i64>,
    quote_a: &Quote,
    quote_b: &Quote,
    trade_count: u64,
) -> Result<(PositionState, Reconciliation), ReconcileError> {
    let pos_a = positions.get(&quote_a.instrument_id).copied().unwrap_or(0);
    let pos_b = positions.get(&quote_b.instrument_id).copied().unwrap_or(0);

    let Some(side) = classify(pos_a, pos_b)? else {
        tracing::info!("No existing positions, starting flat");
        let report = Reconciliation {
            pos_a,
            pos_b,
            delta: 0,
            adopted: None,
            entry_spread: None,
        };
        return Ok((PositionState::with_trade_count(trade_count), report));
    };

    let sample = SpreadSample::from_quotes(quote_a, quote_b)?;
    let prices = HashMap::from([
        (quote_a.instrument_id.clone(), sample.mid_a),
        (quote_b.instrument_id.clone(), sample.mid_b),
    ]);

    tracing::info!(
        side = ?side,
        pos_a,
        pos_b,
        entry_spread = %sample.value,
        "Adopted existing pair position"
    );

    let report = Reconciliation {
        pos_a,
        pos_b,
        delta: pos_a + pos_b,
        adopted: Some(side),
        entry_spread: Some(sample.value),
    };
    Ok((PositionState::adopted(side, sample.value, prices, trade_count), report))
}
