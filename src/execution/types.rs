//! Execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order identifier
pub type OrderId = Uuid;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Lift the ask
    Buy,
    /// Hit the bid
    Sell,
}

impl OrderSide {
    /// Signed multiplier applied to positions on a fill
    pub fn sign(&self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Immediate-or-cancel at the limit price
    Ioc,
}

/// An order to be submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Instrument identifier
    pub instrument_id: String,
    /// Trade side
    pub side: OrderSide,
    /// Limit price
    pub price: Decimal,
    /// Order volume
    pub volume: u64,
    /// Order type
    pub order_type: OrderType,
}

impl Order {
    /// Immediate-or-cancel order
    pub fn ioc(instrument_id: impl Into<String>, side: OrderSide, price: Decimal, volume: u64) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            side,
            price,
            volume,
            order_type: OrderType::Ioc,
        }
    }
}

/// A fill (executed trade)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    /// Order ID
    pub order_id: OrderId,
    /// Instrument ID
    pub instrument_id: String,
    /// Trade side
    pub side: OrderSide,
    /// Fill price
    pub price: Decimal,
    /// Fill volume
    pub volume: u64,
    /// Fill timestamp
    pub timestamp: DateTime<Utc>,
    /// Fees paid
    pub fees: Decimal,
}

/// A leg the gateway accepted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmittedLeg {
    pub order_id: OrderId,
    pub order: Order,
}

/// One leg went through and another did not
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialFailure {
    /// Legs accepted before the failure
    pub completed: Vec<SubmittedLeg>,
    /// Leg whose submission failed
    pub failed: Order,
    /// Position of the failed leg in the submission order
    pub failed_index: usize,
    /// Legs never sent because an earlier one failed
    pub skipped: Vec<Order>,
    /// Gateway error text
    pub error: String,
}

/// Outcome of submitting an approved set of legs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExecutionReport {
    /// Every leg accepted
    Executed(Vec<SubmittedLeg>),
    /// A leg failed; position belief can no longer be trusted
    PartialFailure(PartialFailure),
}
