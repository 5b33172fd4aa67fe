//! Execution module
//!
//! Gateway to the connectivity layer, paired two-leg submission, and an
//! in-memory paper gateway

mod paired;
mod paper;
mod types;

pub use paired::PairedOrderExecutor;
pub use paper::PaperGateway;
pub use types::{
    ExecutionReport, Fill, Order, OrderId, OrderSide, OrderType, PartialFailure, SubmittedLeg,
};

use crate::orderbook::Quote;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Connectivity layer consumed by the engine
#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// Latest top-of-book for an instrument, if any
    async fn get_quote(&self, instrument_id: &str) -> anyhow::Result<Option<Quote>>;
    /// Signed positions by instrument
    async fn get_positions(&self) -> anyhow::Result<HashMap<String, i64>>;
    /// Account P&L, if the venue reports one
    async fn get_pnl(&self) -> anyhow::Result<Option<Decimal>>;
    /// Cash available for margin
    async fn available_cash(&self) -> anyhow::Result<Decimal>;
    /// Submit an order
    async fn submit_order(&self, order: Order) -> anyhow::Result<OrderId>;
}
