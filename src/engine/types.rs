//! Engine types

use crate::execution::{PartialFailure, SubmittedLeg};
use crate::risk::{AmbiguousPosition, PairPosition, ReconcileError, RejectReason, Rejection, TransitionError};
use crate::signal::SignalKind;
use crate::spread::{DataError, SpreadStatistics};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Lifecycle of the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EnginePhase {
    /// `seed` not yet called
    Unseeded,
    /// Seed found positions that are not a pair; operator must confirm
    AwaitingConfirmation(AmbiguousPosition),
    /// Processing ticks
    Running,
    /// A pair was broken; operator must reconcile
    Halted(PartialFailure),
}

/// Orders accepted for one approved signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPairDetails {
    pub kind: SignalKind,
    pub legs: Vec<SubmittedLeg>,
    /// Mid-price spread that triggered the signal
    pub spread: Decimal,
    /// Spread at the prices hit, for opens
    pub execution_spread: Option<Decimal>,
    /// Spread booked at entry; for a close, the entry being unwound
    pub entry_spread: Option<Decimal>,
    /// Exit spread minus entry spread, for closes
    pub spread_change: Option<Decimal>,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineAction {
    /// Statistics ready, no signal
    NoAction,
    /// Not enough samples for statistics yet
    WarmingUp { samples: usize, required: usize },
    /// Guard rail refused the signal
    SignalRejected(Rejection),
    /// Every leg accepted and the position state updated
    OrderPairSubmitted(OrderPairDetails),
    /// Close found nothing left on the exchange; state reset without orders
    PositionCleared,
    /// A leg failed; the engine is now halted
    PartialFailure(PartialFailure),
}

/// Errors from the engine entry points
#[derive(Debug, Error)]
pub enum EngineError {
    /// Tick skipped on unusable market data
    #[error("Market data error: {0}")]
    Data(#[from] DataError),
    #[error("Engine not seeded")]
    NotSeeded,
    #[error("Awaiting operator confirmation: {0}")]
    AwaitingConfirmation(AmbiguousPosition),
    #[error("Engine halted after partial failure on {}", .0.failed.instrument_id)]
    Halted(PartialFailure),
    #[error("No ambiguous start to confirm")]
    NotAwaitingConfirmation,
    #[error("Engine is not halted")]
    NotHalted,
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Gateway(#[from] anyhow::Error),
}

/// Counters and state for the session so far
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub pair_id: String,
    pub ticks: u64,
    pub data_errors: u64,
    /// Actionable signals generated
    pub signals: u64,
    pub rejections: BTreeMap<RejectReason, u64>,
    pub orders_submitted: u64,
    pub trade_count: u64,
    pub position: PairPosition,
    pub entry_spread: Option<Decimal>,
    pub last_spread: Option<Decimal>,
    pub statistics: Option<SpreadStatistics>,
    pub halted: bool,
}
