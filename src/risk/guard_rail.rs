//! Pre-trade guard rail
//!
//! Every signal passes an ordered series of checks before any order is
//! built. The first failing check names the rejection; later checks rely
//! on earlier ones having passed.

use super::{GuardRailConfig, PositionState, RejectReason, Rejection};
use crate::execution::{Order, OrderSide};
use crate::orderbook::{PriceLevel, Quote};
use crate::signal::{Signal, SignalDetail, SignalKind};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Market state read from the gateway right before validation
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub quote_a: Quote,
    pub quote_b: Quote,
    /// Signed positions by instrument; missing instruments are flat
    pub positions: HashMap<String, i64>,
    pub available_cash: Decimal,
}

impl MarketSnapshot {
    pub fn position(&self, instrument_id: &str) -> i64 {
        self.positions.get(instrument_id).copied().unwrap_or(0)
    }
}

/// Orders cleared for submission, in submission order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovedTrade {
    pub kind: SignalKind,
    pub legs: Vec<Order>,
    /// Spread at the prices that will be hit, for opens
    pub execution_spread: Option<Decimal>,
}

/// Runs the guard-rail pipeline
#[derive(Debug, Clone)]
pub struct GuardRailValidator {
    config: GuardRailConfig,
}

impl GuardRailValidator {
    pub fn new(config: GuardRailConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GuardRailConfig {
        &self.config
    }

    /// Validate a signal against the current position and market.
    ///
    /// `Signal::None` approves an empty trade.
    pub fn validate(
        &self,
        signal: &Signal,
        state: &PositionState,
        market: &MarketSnapshot,
    ) -> Result<ApprovedTrade, Rejection> {
        match signal {
            Signal::OpenLongPair(detail) => self.validate_open(Direction::Long, detail, state, market),
            Signal::OpenShortPair(detail) => {
                self.validate_open(Direction::Short, detail, state, market)
            }
            Signal::ClosePosition(_) => self.validate_close(state, market),
            Signal::None => Ok(ApprovedTrade {
                kind: SignalKind::None,
                legs: Vec::new(),
                execution_spread: None,
            }),
        }
    }

    fn validate_open(
        &self,
        direction: Direction,
        detail: &SignalDetail,
        state: &PositionState,
        market: &MarketSnapshot,
    ) -> Result<ApprovedTrade, Rejection> {
        if !self.config.trading_enabled {
            return Err(Rejection::new(RejectReason::TradingDisabled));
        }

        if !state.is_flat() {
            return Err(Rejection::new(RejectReason::AlreadyInPosition));
        }

        let volume = detail.params.target_volume;

        let required = self.config.required_margin(volume);
        if market.available_cash < required {
            return Err(Rejection::new(RejectReason::InsufficientMargin)
                .values(market.available_cash, required));
        }

        let (side_a, side_b) = direction.sides();
        let leg_a = (&market.quote_a, side_a);
        let leg_b = (&market.quote_b, side_b);

        // Position limit after the fill
        let limit = self.config.effective_position_limit();
        for (quote, side) in [leg_a, leg_b] {
            let volume = i64::try_from(volume).unwrap_or(i64::MAX);
            let after = market
                .position(&quote.instrument_id)
                .saturating_add(side.sign().saturating_mul(volume));
            if after.abs() > limit {
                return Err(Rejection::new(RejectReason::PositionLimit)
                    .on(&quote.instrument_id)
                    .values(Decimal::from(after.abs()), Decimal::from(limit)));
            }
        }

        // Liquidity on the side each leg hits
        let needed = self.config.min_available_volume(volume);
        let mut levels = Vec::with_capacity(2);
        for (quote, side) in [leg_a, leg_b] {
            let level = hit_level(quote, side);
            let available = Decimal::from(level.map_or(0, |l| l.volume));
            match level {
                Some(level) if available >= needed => levels.push(level.clone()),
                _ => {
                    return Err(Rejection::new(RejectReason::VolumeLocked)
                        .on(&quote.instrument_id)
                        .values(available, needed))
                }
            }
        }
        let (price_a, price_b) = (levels[0].price, levels[1].price);

        // Bid-ask width; an unconfigured instrument never passes
        for quote in [&market.quote_a, &market.quote_b] {
            let rejection = Rejection::new(RejectReason::SlippageRiskHigh).on(&quote.instrument_id);
            let (Some(width), Some(max)) = (
                quote.bid_ask_spread(),
                self.config.max_spread_for(&quote.instrument_id),
            ) else {
                return Err(rejection);
            };
            if width > max {
                return Err(rejection.values(width, max));
            }
        }

        // Band re-check at execution prices
        let tolerance = self.config.front_run_tolerance;
        let Some(execution_spread) = price_a.checked_div(price_b) else {
            return Err(Rejection::new(RejectReason::FrontRunOrSlipped));
        };
        let slipped = match direction {
            Direction::Short => execution_spread < detail.threshold - tolerance,
            Direction::Long => execution_spread > detail.threshold + tolerance,
        };
        if slipped {
            return Err(Rejection::new(RejectReason::FrontRunOrSlipped)
                .values(execution_spread, detail.threshold));
        }

        let order_a = Order::ioc(&market.quote_a.instrument_id, side_a, price_a, volume);
        let order_b = Order::ioc(&market.quote_b.instrument_id, side_b, price_b, volume);

        // Buy leg first
        let legs = match direction {
            Direction::Long => vec![order_a, order_b],
            Direction::Short => vec![order_b, order_a],
        };

        Ok(ApprovedTrade {
            kind: direction.kind(),
            legs,
            execution_spread: Some(execution_spread),
        })
    }

    fn validate_close(
        &self,
        state: &PositionState,
        market: &MarketSnapshot,
    ) -> Result<ApprovedTrade, Rejection> {
        if !self.config.trading_enabled {
            return Err(Rejection::new(RejectReason::TradingDisabled));
        }

        if state.is_flat() {
            return Err(Rejection::new(RejectReason::NoPosition));
        }

        let mut legs = Vec::with_capacity(2);
        for quote in [&market.quote_a, &market.quote_b] {
            let position = market.position(&quote.instrument_id);
            if position == 0 {
                continue;
            }

            let side = if position > 0 { OrderSide::Sell } else { OrderSide::Buy };
            let volume = position.unsigned_abs();
            let level = hit_level(quote, side);
            let available = level.map_or(0, |l| l.volume);

            match level {
                Some(level) if available >= volume => {
                    legs.push(Order::ioc(&quote.instrument_id, side, level.price, volume));
                }
                _ => {
                    return Err(Rejection::new(RejectReason::VolumeLocked)
                        .on(&quote.instrument_id)
                        .values(Decimal::from(available), Decimal::from(volume)))
                }
            }
        }

        Ok(ApprovedTrade {
            kind: SignalKind::ClosePosition,
            legs,
            execution_spread: None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Order sides for instruments A and B
    fn sides(&self) -> (OrderSide, OrderSide) {
        match self {
            Direction::Long => (OrderSide::Buy, OrderSide::Sell),
            Direction::Short => (OrderSide::Sell, OrderSide::Buy),
        }
    }

    fn kind(&self) -> SignalKind {
        match self {
            Direction::Long => SignalKind::OpenLongPair,
            Direction::Short => SignalKind::OpenShortPair,
        }
    }
}

/// Book level a marketable order on `side` would trade against
fn hit_level(quote: &Quote, side: OrderSide) -> Option<&PriceLevel> {
    match side {
        OrderSide::Buy => quote.ask.as_ref(),
        OrderSide::Sell => quote.bid.as_ref(),
    }
}
