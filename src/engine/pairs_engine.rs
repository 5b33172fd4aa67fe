//! Tick-driven pairs engine
//!
//! One call to `on_tick` runs the full pipeline:
//! 1. Update the spread window from the tick's quotes
//! 2. Generate at most one signal from the rolling statistics
//! 3. Re-read the market and run the guard rail
//! 4. Submit the approved legs and apply the position transition

use super::{EngineAction, EngineError, EnginePhase, OrderPairDetails, SessionSummary};
use crate::config::{Config, PairConfig};
use crate::execution::{ExecutionReport, MarketGateway, PairedOrderExecutor, SubmittedLeg};
use crate::orderbook::Quote;
use crate::risk::{
    reconcile, ApprovedTrade, GuardRailConfig, GuardRailValidator, MarketSnapshot, PairPosition, PairSide,
    PositionState, ReconcileError, Reconciliation, RejectReason,
};
use crate::signal::{Signal, SignalGenerator, SignalKind};
use crate::spread::{DataError, SpreadSample, SpreadTracker};
use crate::telemetry::{self, GaugeMetric, LatencyMetric};
use rust_decimal::prelude::ToPrimitive;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

/// Pairs engine for one instrument pair
pub struct PairsEngine<G: MarketGateway> {
    gateway: Arc<G>,
    pair: PairConfig,
    pair_id: String,
    tracker: SpreadTracker,
    state: PositionState,
    generator: SignalGenerator,
    validator: GuardRailValidator,
    executor: PairedOrderExecutor,
    phase: EnginePhase,
    ticks: u64,
    data_errors: u64,
    signals: u64,
    rejections: BTreeMap<RejectReason, u64>,
    orders_submitted: u64,
}

impl<G: MarketGateway> PairsEngine<G> {
    /// Create an unseeded engine
    pub fn new(
        gateway: Arc<G>,
        pair: PairConfig,
        tracker: SpreadTracker,
        guard_rail: GuardRailConfig,
    ) -> Self {
        let pair_id = pair.pair_id();
        Self {
            gateway,
            generator: SignalGenerator::new(pair_id.clone(), &guard_rail),
            validator: GuardRailValidator::new(guard_rail),
            pair,
            pair_id,
            tracker,
            state: PositionState::new(),
            executor: PairedOrderExecutor::new(),
            phase: EnginePhase::Unseeded,
            ticks: 0,
            data_errors: 0,
            signals: 0,
            rejections: BTreeMap::new(),
            orders_submitted: 0,
        }
    }

    /// Create an engine from a loaded configuration
    pub fn from_config(gateway: Arc<G>, config: &Config) -> Self {
        Self::new(
            gateway,
            config.pair.clone(),
            SpreadTracker::new(config.tracker.window, config.tracker.min_samples),
            config.guard_rail.clone(),
        )
    }

    /// Classify observed positions once, before the first tick.
    ///
    /// Ambiguous positions leave the engine awaiting
    /// [`confirm_ambiguous_start`](Self::confirm_ambiguous_start).
    pub fn seed(
        &mut self,
        positions: &HashMap<String, i64>,
        quote_a: &Quote,
        quote_b: &Quote,
    ) -> Result<Reconciliation, ReconcileError> {
        if self.phase != EnginePhase::Unseeded {
            return Err(ReconcileError::AlreadySeeded);
        }
        self.apply_reconciliation(positions, quote_a, quote_b)
    }

    /// Seed from the gateway's current positions and quotes
    pub async fn seed_from_gateway(&mut self) -> Result<Reconciliation, EngineError> {
        let (positions, quote_a, quote_b) = self.read_account().await?;
        Ok(self.seed(&positions, &quote_a, &quote_b)?)
    }

    /// Operator confirmation after an ambiguous seed: start flat
    pub fn confirm_ambiguous_start(&mut self) -> Result<(), EngineError> {
        let EnginePhase::AwaitingConfirmation(ambiguous) = &self.phase else {
            return Err(EngineError::NotAwaitingConfirmation);
        };

        tracing::warn!(
            pos_a = ambiguous.pos_a,
            pos_b = ambiguous.pos_b,
            delta = ambiguous.delta,
            "Operator confirmed start despite unpaired positions, treating as flat"
        );
        self.state = PositionState::with_trade_count(self.state.trade_count());
        self.set_phase(EnginePhase::Running);
        Ok(())
    }

    /// Re-classify positions after a partial failure and resume.
    ///
    /// Ambiguous positions move the engine to awaiting confirmation.
    pub fn reconcile_after_failure(
        &mut self,
        positions: &HashMap<String, i64>,
        quote_a: &Quote,
        quote_b: &Quote,
    ) -> Result<Reconciliation, EngineError> {
        if !matches!(self.phase, EnginePhase::Halted(_)) {
            return Err(EngineError::NotHalted);
        }
        let report = self.apply_reconciliation(positions, quote_a, quote_b)?;
        tracing::info!(position = %self.state.position(), "Halt cleared by reconciliation");
        Ok(report)
    }

    /// [`reconcile_after_failure`](Self::reconcile_after_failure) from the gateway's view
    pub async fn reconcile_after_failure_from_gateway(
        &mut self,
    ) -> Result<Reconciliation, EngineError> {
        let (positions, quote_a, quote_b) = self.read_account().await?;
        self.reconcile_after_failure(&positions, &quote_a, &quote_b)
    }

    /// Process one tick
    pub async fn on_tick(
        &mut self,
        quote_a: &Quote,
        quote_b: &Quote,
    ) -> Result<EngineAction, EngineError> {
        match &self.phase {
            EnginePhase::Running => {}
            EnginePhase::Unseeded => return Err(EngineError::NotSeeded),
            EnginePhase::AwaitingConfirmation(ambiguous) => {
                return Err(EngineError::AwaitingConfirmation(ambiguous.clone()))
            }
            EnginePhase::Halted(failure) => return Err(EngineError::Halted(failure.clone())),
        }

        let start = Instant::now();
        self.ticks += 1;
        telemetry::metrics::record_tick();

        let result = self.evaluate(quote_a, quote_b).await;
        telemetry::record_latency(LatencyMetric::TickEvaluation, start.elapsed());
        result
    }

    pub fn phase(&self) -> &EnginePhase {
        &self.phase
    }

    pub fn position_state(&self) -> &PositionState {
        &self.state
    }

    pub fn tracker(&self) -> &SpreadTracker {
        &self.tracker
    }

    pub fn pair_id(&self) -> &str {
        &self.pair_id
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Session counters and current state
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            pair_id: self.pair_id.clone(),
            ticks: self.ticks,
            data_errors: self.data_errors,
            signals: self.signals,
            rejections: self.rejections.clone(),
            orders_submitted: self.orders_submitted,
            trade_count: self.state.trade_count(),
            position: self.state.position(),
            entry_spread: self.state.entry_spread(),
            last_spread: self.tracker.last_spread().map(|s| s.value),
            statistics: self.tracker.statistics(),
            halted: matches!(self.phase, EnginePhase::Halted(_)),
        }
    }

    async fn evaluate(
        &mut self,
        quote_a: &Quote,
        quote_b: &Quote,
    ) -> Result<EngineAction, EngineError> {
        let sample = match check_instruments(&self.pair, quote_a, quote_b)
            .and_then(|()| self.tracker.update(quote_a, quote_b))
        {
            Ok(sample) => sample,
            Err(e) => {
                self.data_errors += 1;
                telemetry::metrics::record_data_error();
                tracing::debug!(error = %e, "Skipping tick");
                return Err(e.into());
            }
        };
        set_gauge(GaugeMetric::Spread, sample.value);

        let Some(stats) = self.tracker.statistics() else {
            tracing::debug!(
                samples = self.tracker.len(),
                required = self.tracker.min_samples(),
                "Warming up"
            );
            return Ok(EngineAction::WarmingUp {
                samples: self.tracker.len(),
                required: self.tracker.min_samples(),
            });
        };
        set_gauge(GaugeMetric::SpreadMean, stats.mean);
        set_gauge(GaugeMetric::SpreadStdDev, stats.std_dev);

        let signal = self
            .generator
            .generate(sample.value, &stats, self.state.position());
        let Some(detail) = signal.detail() else {
            tracing::debug!(spread = %sample.value, mean = %stats.mean, "No signal");
            return Ok(EngineAction::NoAction);
        };

        self.signals += 1;
        telemetry::metrics::record_signal(signal.kind().as_str());
        tracing::info!(
            pair = %self.pair_id,
            kind = %signal.kind(),
            spread = %detail.spread,
            threshold = %detail.threshold,
            reason = %detail.reason,
            "Signal generated"
        );

        let market = self.snapshot().await?;
        let approved = match self.validator.validate(&signal, &self.state, &market) {
            Ok(approved) => approved,
            Err(rejection) => {
                *self.rejections.entry(rejection.reason).or_insert(0) += 1;
                telemetry::metrics::record_rejection(rejection.reason.as_str());
                tracing::warn!(
                    kind = %signal.kind(),
                    reason = %rejection.reason,
                    instrument = ?rejection.instrument,
                    observed = ?rejection.observed,
                    limit = ?rejection.limit,
                    "Signal rejected"
                );
                return Ok(EngineAction::SignalRejected(rejection));
            }
        };

        if approved.legs.is_empty() {
            if !clears_without_orders(&approved) {
                return Ok(EngineAction::NoAction);
            }
            tracing::warn!(
                position = %self.state.position(),
                "No positions left on the exchange, clearing pair state"
            );
            self.state.close();
            self.publish_state();
            return Ok(EngineAction::PositionCleared);
        }

        let report = self
            .executor
            .execute(self.gateway.as_ref(), &approved.legs)
            .await;

        match report {
            ExecutionReport::Executed(legs) => {
                self.orders_submitted += legs.len() as u64;

                // Read before the transition wipes it on a close
                let (entry_spread, spread_change) = if signal.is_open() {
                    (approved.execution_spread, None)
                } else {
                    let entry = self.state.entry_spread();
                    (entry, entry.map(|entry| sample.value - entry))
                };

                self.apply_transition(&signal, &sample, &approved, &legs)?;
                self.publish_state();

                tracing::info!(
                    kind = %approved.kind,
                    position = %self.state.position(),
                    trade_count = self.state.trade_count(),
                    spread = %sample.value,
                    execution_spread = ?approved.execution_spread,
                    entry_spread = ?entry_spread,
                    spread_change = ?spread_change,
                    "Order pair submitted"
                );
                Ok(EngineAction::OrderPairSubmitted(OrderPairDetails {
                    kind: approved.kind,
                    legs,
                    spread: sample.value,
                    execution_spread: approved.execution_spread,
                    entry_spread,
                    spread_change,
                }))
            }
            ExecutionReport::PartialFailure(failure) => {
                self.orders_submitted += failure.completed.len() as u64;
                tracing::error!(
                    kind = %approved.kind,
                    failed = %failure.failed.instrument_id,
                    completed = failure.completed.len(),
                    error = %failure.error,
                    "Partial failure, halting until positions are reconciled"
                );
                self.set_phase(EnginePhase::Halted(failure.clone()));
                Ok(EngineAction::PartialFailure(failure))
            }
        }
    }

    fn apply_transition(
        &mut self,
        signal: &Signal,
        sample: &SpreadSample,
        approved: &ApprovedTrade,
        legs: &[SubmittedLeg],
    ) -> Result<(), EngineError> {
        let side = match signal {
            Signal::OpenLongPair(_) => PairSide::LongPair,
            Signal::OpenShortPair(_) => PairSide::ShortPair,
            Signal::ClosePosition(_) => {
                self.state.close();
                return Ok(());
            }
            Signal::None => return Ok(()),
        };

        let prices = legs
            .iter()
            .map(|leg| (leg.order.instrument_id.clone(), leg.order.price))
            .collect();
        // Entry is booked at the prices hit, not the mids
        let entry_spread = approved.execution_spread.unwrap_or(sample.value);
        self.state.open(side, entry_spread, prices)?;
        Ok(())
    }

    fn apply_reconciliation(
        &mut self,
        positions: &HashMap<String, i64>,
        quote_a: &Quote,
        quote_b: &Quote,
    ) -> Result<Reconciliation, ReconcileError> {
        match reconcile(positions, quote_a, quote_b, self.state.trade_count()) {
            Ok((state, report)) => {
                self.state = state;
                self.set_phase(EnginePhase::Running);
                self.publish_state();
                Ok(report)
            }
            Err(ReconcileError::Ambiguous(ambiguous)) => {
                tracing::warn!(
                    pos_a = ambiguous.pos_a,
                    pos_b = ambiguous.pos_b,
                    delta = ambiguous.delta,
                    "Ambiguous positions, awaiting operator confirmation"
                );
                self.set_phase(EnginePhase::AwaitingConfirmation(ambiguous.clone()));
                Err(ReconcileError::Ambiguous(ambiguous))
            }
            Err(e) => Err(e),
        }
    }

    /// Fresh quotes, positions and cash for validation
    async fn snapshot(&self) -> Result<MarketSnapshot, EngineError> {
        let (positions, quote_a, quote_b) = self.read_account().await?;
        let available_cash = self.gateway.available_cash().await?;
        Ok(MarketSnapshot {
            quote_a,
            quote_b,
            positions,
            available_cash,
        })
    }

    async fn read_account(&self) -> Result<(HashMap<String, i64>, Quote, Quote), EngineError> {
        let positions = self.gateway.get_positions().await?;
        let quote_a = self.fetch_quote(&self.pair.instrument_a).await?;
        let quote_b = self.fetch_quote(&self.pair.instrument_b).await?;
        Ok((positions, quote_a, quote_b))
    }

    async fn fetch_quote(&self, instrument_id: &str) -> Result<Quote, EngineError> {
        self.gateway
            .get_quote(instrument_id)
            .await?
            .ok_or_else(|| DataError::QuoteUnavailable(instrument_id.to_string()).into())
    }

    fn set_phase(&mut self, phase: EnginePhase) {
        let halted = matches!(phase, EnginePhase::Halted(_));
        self.phase = phase;
        telemetry::set_gauge(GaugeMetric::Halted, if halted { 1.0 } else { 0.0 });
    }

    fn publish_state(&self) {
        let position = match self.state.position() {
            PairPosition::Flat => 0.0,
            PairPosition::LongPair => 1.0,
            PairPosition::ShortPair => -1.0,
        };
        telemetry::set_gauge(GaugeMetric::PairPosition, position);
        telemetry::set_gauge(GaugeMetric::TradeCount, self.state.trade_count() as f64);
    }
}

/// An approved close with no legs means the exchange is already flat
fn clears_without_orders(approved: &ApprovedTrade) -> bool {
    approved.legs.is_empty() && approved.kind == SignalKind::ClosePosition
}

/// Both quotes must belong to the configured pair, in order
fn check_instruments(
    pair: &PairConfig,
    quote_a: &Quote,
    quote_b: &Quote,
) -> Result<(), DataError> {
    if quote_a.instrument_id != pair.instrument_a || quote_b.instrument_id != pair.instrument_b {
        return Err(DataError::InstrumentMismatch {
            expected: format!("{}/{}", pair.instrument_a, pair.instrument_b),
            actual: format!("{}/{}", quote_a.instrument_id, quote_b.instrument_id),
        });
    }
    Ok(())
}

fn set_gauge(metric: GaugeMetric, value: rust_decimal::Decimal) {
    if let Some(value) = value.to_f64() {
        telemetry::set_gauge(metric, value);
    }
}
