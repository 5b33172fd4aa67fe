//! Spread types

use crate::orderbook::Quote;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Market data problems that make a tick unusable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// A quote is missing its bid or ask level
    #[error("Incomplete book for {instrument} (bid: {has_bid}, ask: {has_ask})")]
    IncompleteBook {
        instrument: String,
        has_bid: bool,
        has_ask: bool,
    },
    /// Mid price of the denominator instrument is zero
    #[error("Zero mid price for {0}")]
    ZeroPrice(String),
    /// The connectivity layer returned no quote
    #[error("No quote available for {0}")]
    QuoteUnavailable(String),
    /// Quotes do not belong to the configured pair
    #[error("Quotes for {actual} do not match pair {expected}")]
    InstrumentMismatch { expected: String, actual: String },
}

/// One observation of the mid-price ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadSample {
    /// mid(A) / mid(B)
    pub value: Decimal,
    /// Mid price of instrument A
    pub mid_a: Decimal,
    /// Mid price of instrument B
    pub mid_b: Decimal,
    /// Observation timestamp
    pub timestamp: DateTime<Utc>,
}

impl SpreadSample {
    /// Compute the ratio from two quotes without recording it anywhere
    pub fn from_quotes(quote_a: &Quote, quote_b: &Quote) -> Result<Self, DataError> {
        let mid_a = mid_of(quote_a)?;
        let mid_b = mid_of(quote_b)?;
        if mid_b.is_zero() {
            return Err(DataError::ZeroPrice(quote_b.instrument_id.clone()));
        }

        Ok(Self {
            value: mid_a / mid_b,
            mid_a,
            mid_b,
            timestamp: Utc::now(),
        })
    }
}

fn mid_of(quote: &Quote) -> Result<Decimal, DataError> {
    quote.mid_price().ok_or_else(|| DataError::IncompleteBook {
        instrument: quote.instrument_id.clone(),
        has_bid: quote.bid.is_some(),
        has_ask: quote.ask.is_some(),
    })
}

/// Mean and sample standard deviation of the current window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadStatistics {
    pub mean: Decimal,
    pub std_dev: Decimal,
}
