//! Paper trading gateway

use super::{Fill, MarketGateway, Order, OrderId};
use crate::orderbook::Quote;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct PaperState {
    quotes: HashMap<String, Quote>,
    positions: HashMap<String, i64>,
    cash: Decimal,
    fills: Vec<Fill>,
    failing: HashSet<String>,
}

/// In-memory gateway that fills every order in full at its limit price
pub struct PaperGateway {
    fee_rate: Decimal,
    initial_cash: Decimal,
    state: RwLock<PaperState>,
}

impl PaperGateway {
    /// Create a paper gateway with starting cash and a proportional fee
    pub fn new(initial_cash: Decimal, fee_rate: Decimal) -> Self {
        Self {
            fee_rate,
            initial_cash,
            state: RwLock::new(PaperState {
                cash: initial_cash,
                ..Default::default()
            }),
        }
    }

    /// Publish the latest quote for its instrument
    pub async fn set_quote(&self, quote: Quote) {
        let mut state = self.state.write().await;
        state.quotes.insert(quote.instrument_id.clone(), quote);
    }

    /// Overwrite a position, e.g. to simulate holdings left from a prior session
    pub async fn set_position(&self, instrument_id: impl Into<String>, position: i64) {
        let mut state = self.state.write().await;
        state.positions.insert(instrument_id.into(), position);
    }

    /// Make every subsequent order for `instrument_id` fail
    pub async fn fail_orders_for(&self, instrument_id: impl Into<String>) {
        let mut state = self.state.write().await;
        state.failing.insert(instrument_id.into());
    }

    /// Stop failing orders for `instrument_id`
    pub async fn clear_failures(&self) {
        let mut state = self.state.write().await;
        state.failing.clear();
    }

    /// All fills so far
    pub async fn fills(&self) -> Vec<Fill> {
        let state = self.state.read().await;
        state.fills.clone()
    }
}

#[async_trait]
impl MarketGateway for PaperGateway {
    async fn get_quote(&self, instrument_id: &str) -> anyhow::Result<Option<Quote>> {
        let state = self.state.read().await;
        Ok(state.quotes.get(instrument_id).cloned())
    }

    async fn get_positions(&self) -> anyhow::Result<HashMap<String, i64>> {
        let state = self.state.read().await;
        Ok(state.positions.clone())
    }

    async fn get_pnl(&self) -> anyhow::Result<Option<Decimal>> {
        let state = self.state.read().await;

        // Mark open positions at mid; unpriceable without a two-sided book
        let mut marked = Decimal::ZERO;
        for (instrument, position) in &state.positions {
            if *position == 0 {
                continue;
            }
            let Some(mid) = state.quotes.get(instrument).and_then(Quote::mid_price) else {
                return Ok(None);
            };
            marked += mid * Decimal::from(*position);
        }

        Ok(Some(state.cash + marked - self.initial_cash))
    }

    async fn available_cash(&self) -> anyhow::Result<Decimal> {
        let state = self.state.read().await;
        Ok(state.cash)
    }

    async fn submit_order(&self, order: Order) -> anyhow::Result<OrderId> {
        let mut state = self.state.write().await;

        if state.failing.contains(&order.instrument_id) {
            anyhow::bail!("Paper order rejected for {}", order.instrument_id);
        }

        let order_id = OrderId::new_v4();
        let notional = order.price * Decimal::from(order.volume);
        let fees = notional * self.fee_rate;

        let signed = order.side.sign() * i64::try_from(order.volume)?;
        *state.positions.entry(order.instrument_id.clone()).or_insert(0) += signed;
        state.cash -= Decimal::from(order.side.sign()) * notional + fees;

        state.fills.push(Fill {
            order_id,
            instrument_id: order.instrument_id,
            side: order.side,
            price: order.price,
            volume: order.volume,
            timestamp: Utc::now(),
            fees,
        });

        tracing::info!(?order_id, side = %order.side, price = %order.price, "Paper order filled");
        Ok(order_id)
    }
}
