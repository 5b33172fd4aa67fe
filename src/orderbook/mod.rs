//! Order book module
//!
//! Top-of-book snapshots supplied by the connectivity layer once per tick

mod quote;

pub use quote::Quote;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price level in the order book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price at this level
    pub price: Decimal,
    /// Total volume available
    pub volume: u64,
}

impl PriceLevel {
    pub fn new(price: Decimal, volume: u64) -> Self {
        Self { price, volume }
    }
}
