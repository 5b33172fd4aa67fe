//! Top-of-book quote snapshot

use super::PriceLevel;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Best bid and best ask for one instrument at one polling tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument identifier
    pub instrument_id: String,
    /// Best bid level, absent when the bid side is empty
    pub bid: Option<PriceLevel>,
    /// Best ask level, absent when the ask side is empty
    pub ask: Option<PriceLevel>,
    /// Snapshot timestamp
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// Create a quote with both sides empty
    pub fn new(instrument_id: impl Into<String>) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            bid: None,
            ask: None,
            updated_at: Utc::now(),
        }
    }

    /// Create a quote with both sides populated
    pub fn two_sided(
        instrument_id: impl Into<String>,
        bid_price: Decimal,
        bid_volume: u64,
        ask_price: Decimal,
        ask_volume: u64,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            bid: Some(PriceLevel::new(bid_price, bid_volume)),
            ask: Some(PriceLevel::new(ask_price, ask_volume)),
            updated_at: Utc::now(),
        }
    }

    /// Get best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bid.as_ref().map(|l| l.price)
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.ask.as_ref().map(|l| l.price)
    }

    /// Get volume resting at the best bid
    pub fn best_bid_volume(&self) -> Option<u64> {
        self.bid.as_ref().map(|l| l.volume)
    }

    /// Get volume resting at the best ask
    pub fn best_ask_volume(&self) -> Option<u64> {
        self.ask.as_ref().map(|l| l.volume)
    }

    /// True when both a bid and an ask level are present
    pub fn is_complete(&self) -> bool {
        self.bid.is_some() && self.ask.is_some()
    }

    /// Get mid price
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    /// Get best ask minus best bid
    pub fn bid_ask_spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_mid_price() {
        let quote = Quote::two_sided("PHILLIPS_A", dec!(100.0), 10, dec!(100.2), 12);

        assert_eq!(quote.mid_price(), Some(dec!(100.1)));
        assert_eq!(quote.bid_ask_spread(), Some(dec!(0.2)));
        assert!(quote.is_complete());
    }

    #[test]
    fn test_quote_new_is_empty() {
        let quote = Quote::new("PHILLIPS_B");
        assert_eq!(quote.instrument_id, "PHILLIPS_B");
        assert!(quote.best_bid().is_none());
        assert!(quote.best_ask().is_none());
        assert!(!quote.is_complete());
    }

    #[test]
    fn test_quote_volumes() {
        let quote = Quote::two_sided("PHILLIPS_A", dec!(99.9), 7, dec!(100.1), 3);
        assert_eq!(quote.best_bid_volume(), Some(7));
        assert_eq!(quote.best_ask_volume(), Some(3));
    }

    #[test]
    fn test_quote_mid_price_no_bid() {
        let mut quote = Quote::new("PHILLIPS_A");
        quote.ask = Some(PriceLevel::new(dec!(100.1), 5));
        assert!(quote.mid_price().is_none());
        assert!(quote.bid_ask_spread().is_none());
        assert!(!quote.is_complete());
    }

    #[test]
    fn test_quote_mid_price_no_ask() {
        let mut quote = Quote::new("PHILLIPS_A");
        quote.bid = Some(PriceLevel::new(dec!(99.9), 5));
        assert!(quote.mid_price().is_none());
    }

    #[test]
    fn test_quote_deserialize_without_timestamp() {
        let json = r#"{
            "instrument_id": "PHILLIPS_A",
            "bid": {"price": "99.5", "volume": 20},
            "ask": null
        }"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.best_bid(), Some(dec!(99.5)));
        assert!(quote.ask.is_none());
    }
}
