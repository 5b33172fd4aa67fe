//! Paired two-leg order submission

use super::{ExecutionReport, MarketGateway, Order, PartialFailure, SubmittedLeg};
use std::time::Instant;

/// Submits the legs of an approved trade one after another.
///
/// Submission stops at the first rejected leg; nothing already sent is
/// cancelled or reversed.
#[derive(Debug, Clone, Default)]
pub struct PairedOrderExecutor;

impl PairedOrderExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Submit `legs` in order and report what happened
    pub async fn execute<G>(&self, gateway: &G, legs: &[Order]) -> ExecutionReport
    where
        G: MarketGateway + ?Sized,
    {
        let start = Instant::now();
        let mut completed = Vec::with_capacity(legs.len());

        for (index, order) in legs.iter().enumerate() {
            match gateway.submit_order(order.clone()).await {
                Ok(order_id) => {
                    tracing::info!(
                        leg = index,
                        %order_id,
                        instrument = %order.instrument_id,
                        side = %order.side,
                        price = %order.price,
                        volume = order.volume,
                        "Leg submitted"
                    );
                    crate::telemetry::metrics::record_leg_submitted(&order.instrument_id, true);
                    completed.push(SubmittedLeg {
                        order_id,
                        order: order.clone(),
                    });
                }
                Err(e) => {
                    tracing::error!(
                        leg = index,
                        instrument = %order.instrument_id,
                        side = %order.side,
                        completed = completed.len(),
                        error = %e,
                        "Leg submission failed, pair is broken"
                    );
                    crate::telemetry::metrics::record_leg_submitted(&order.instrument_id, false);
                    return ExecutionReport::PartialFailure(PartialFailure {
                        completed,
                        failed: order.clone(),
                        failed_index: index,
                        skipped: legs[index + 1..].to_vec(),
                        error: e.to_string(),
                    });
                }
            }
        }

        crate::telemetry::metrics::record_execution_latency(start.elapsed());
        ExecutionReport::Executed(completed)
    }
}
