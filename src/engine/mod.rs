//! Pairs trading engine
//!
//! Owns the spread tracker, position state and guard rail for one pair and
//! drives them once per tick

mod pairs_engine;
mod types;

pub use pairs_engine::PairsEngine;
pub use types::{EngineAction, EngineError, EnginePhase, OrderPairDetails, SessionSummary};
