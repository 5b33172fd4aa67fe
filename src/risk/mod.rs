//! Risk management module
//!
//! Pair position state, startup reconciliation, and the pre-trade guard rail

mod guard_rail;
mod limits;
mod position;
mod reconcile;
mod types;

pub use guard_rail::{ApprovedTrade, GuardRailValidator, MarketSnapshot};
pub use limits::GuardRailConfig;
pub use position::{PairPosition, PairSide, PositionState, TransitionError};
pub use reconcile::{classify, reconcile, AmbiguousPosition, ReconcileError, Reconciliation};
pub use types::{RejectReason, Rejection};
