//! pairs-guard: Mean-reversion pairs trading engine
//!
//! This library provides the core components for:
//! - Rolling spread statistics over the ratio of two mid prices
//! - Band-based entry and exit signals with hysteresis
//! - Pair position state with startup reconciliation
//! - Ordered pre-trade guard-rail checks
//! - Sequential two-leg execution with partial-failure halting
//! - Paper gateway and quote replay
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod engine;
pub mod execution;
pub mod orderbook;
pub mod risk;
pub mod signal;
pub mod spread;
pub mod telemetry;
