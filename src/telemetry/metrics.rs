//! Prometheus metrics

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full `on_tick` evaluation
    TickEvaluation,
    /// Submission of every leg of an approved trade
    PairExecution,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Latest mid-price spread
    Spread,
    /// Rolling mean of the spread
    SpreadMean,
    /// Rolling standard deviation of the spread
    SpreadStdDev,
    /// Pair position: -1 short, 0 flat, 1 long
    PairPosition,
    /// Pair entries since start
    TradeCount,
    /// 1 while halted on a partial failure
    Halted,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::TickEvaluation => "pairs_tick_evaluation_latency_ms",
        LatencyMetric::PairExecution => "pairs_pair_execution_latency_ms",
    };

    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::Spread => "pairs_spread",
        GaugeMetric::SpreadMean => "pairs_spread_mean",
        GaugeMetric::SpreadStdDev => "pairs_spread_stddev",
        GaugeMetric::PairPosition => "pairs_position",
        GaugeMetric::TradeCount => "pairs_trade_count",
        GaugeMetric::Halted => "pairs_halted",
    };

    metrics::gauge!(metric_name).set(value);
}

pub fn record_execution_latency(duration: Duration) {
    record_latency(LatencyMetric::PairExecution, duration);
}

/// Count an actionable signal by kind
pub fn record_signal(kind: &'static str) {
    metrics::counter!("pairs_signals_total", "kind" => kind).increment(1);
}

/// Count a guard-rail rejection by reason
pub fn record_rejection(reason: &'static str) {
    metrics::counter!("pairs_rejections_total", "reason" => reason).increment(1);
}

/// Count a leg submission attempt
pub fn record_leg_submitted(instrument: &str, accepted: bool) {
    let outcome = if accepted { "accepted" } else { "failed" };
    metrics::counter!(
        "pairs_legs_submitted_total",
        "instrument" => instrument.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_tick() {
    metrics::counter!("pairs_ticks_total").increment(1);
}

/// Count a tick dropped on unusable market data
pub fn record_data_error() {
    metrics::counter!("pairs_data_errors_total").increment(1);
}
