//! Signal generation module
//!
//! Turns spread deviations into open/close decisions

mod generator;
mod types;

pub use generator::SignalGenerator;
pub use types::{Bands, Signal, SignalDetail, SignalKind, SignalParams};
