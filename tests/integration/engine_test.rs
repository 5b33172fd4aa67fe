//! End-to-end engine tests against the paper gateway

use pairs_guard::config::PairConfig;
use pairs_guard::engine::{EngineAction, EngineError, EnginePhase, PairsEngine};
use pairs_guard::execution::{MarketGateway, OrderSide, PaperGateway};
use pairs_guard::orderbook::Quote;
use pairs_guard::risk::{
    GuardRailConfig, PairPosition, PairSide, ReconcileError, RejectReason,
};
use pairs_guard::signal::SignalKind;
use pairs_guard::spread::SpreadTracker;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

const A: &str = "PHILLIPS_A";
const B: &str = "PHILLIPS_B";

/// Mid ratios that fill the window without crossing a band
const WARM_UP: [Decimal; 5] = [dec!(100), dec!(101), dec!(99), dec!(100), dec!(100)];

fn rails() -> GuardRailConfig {
    GuardRailConfig {
        max_acceptable_spread: HashMap::from([(A.to_string(), dec!(2.0)), (B.to_string(), dec!(2.0))]),
        ..Default::default()
    }
}

fn engine_with(gateway: &Arc<PaperGateway>, rails: GuardRailConfig) -> PairsEngine<PaperGateway> {
    PairsEngine::new(
        Arc::clone(gateway),
        PairConfig::new(A, B),
        SpreadTracker::new(10, 5),
        rails,
    )
}

fn gateway() -> Arc<PaperGateway> {
    Arc::new(PaperGateway::new(dec!(10000), dec!(0)))
}

/// Quotes 0.1 either side of the mids, 50 lots deep
fn quotes(mid_a: Decimal, mid_b: Decimal) -> (Quote, Quote) {
    (
        Quote::two_sided(A, mid_a - dec!(0.1), 50, mid_a + dec!(0.1), 50),
        Quote::two_sided(B, mid_b - dec!(0.1), 50, mid_b + dec!(0.1), 50),
    )
}

/// Publish the quotes to the gateway, then run the tick
async fn tick(
    engine: &mut PairsEngine<PaperGateway>,
    gateway: &PaperGateway,
    mid_a: Decimal,
) -> Result<EngineAction, EngineError> {
    let (a, b) = quotes(mid_a, dec!(100));
    gateway.set_quote(a.clone()).await;
    gateway.set_quote(b.clone()).await;
    engine.on_tick(&a, &b).await
}

async fn seed_flat(engine: &mut PairsEngine<PaperGateway>, gateway: &PaperGateway) {
    let (a, b) = quotes(dec!(100), dec!(100));
    gateway.set_quote(a).await;
    gateway.set_quote(b).await;
    let report = engine.seed_from_gateway().await.unwrap();
    assert_eq!(report.adopted, None);
}

async fn warm_up(engine: &mut PairsEngine<PaperGateway>, gateway: &PaperGateway) {
    for (i, mid_a) in WARM_UP.into_iter().enumerate() {
        let action = tick(engine, gateway, mid_a).await.unwrap();
        if i < WARM_UP.len() - 1 {
            assert!(matches!(action, EngineAction::WarmingUp { .. }), "{action:?}");
        } else {
            assert_eq!(action, EngineAction::NoAction);
        }
    }
}

#[tokio::test]
async fn test_short_pair_round_trip() {
    let gateway = gateway();
    let mut engine = engine_with(&gateway, rails());
    seed_flat(&mut engine, &gateway).await;
    warm_up(&mut engine, &gateway).await;

    // Ratio jumps to 1.05: A rich, sell A and buy B
    let action = tick(&mut engine, &gateway, dec!(105)).await.unwrap();
    let EngineAction::OrderPairSubmitted(details) = action else {
        panic!("expected open, got {action:?}");
    };
    assert_eq!(details.kind, SignalKind::OpenShortPair);
    assert_eq!(details.legs[0].order.instrument_id, B);
    assert_eq!(details.legs[0].order.side, OrderSide::Buy);
    assert_eq!(details.legs[0].order.price, dec!(100.1));
    assert_eq!(details.legs[1].order.instrument_id, A);
    assert_eq!(details.legs[1].order.side, OrderSide::Sell);
    assert_eq!(details.legs[1].order.price, dec!(104.9));
    assert_eq!(details.spread, dec!(1.05));
    let entry = dec!(104.9) / dec!(100.1);
    assert_eq!(details.execution_spread, Some(entry));
    assert_eq!(details.entry_spread, Some(entry));
    assert!(details.spread_change.is_none());

    // Booked at the prices hit, not the mids
    let state = engine.position_state();
    assert_eq!(state.position(), PairPosition::ShortPair);
    assert_eq!(state.entry_spread(), Some(entry));
    assert_eq!(state.trade_count(), 1);

    // Reverts to 1.00: close both legs
    let action = tick(&mut engine, &gateway, dec!(100)).await.unwrap();
    let EngineAction::OrderPairSubmitted(details) = action else {
        panic!("expected close, got {action:?}");
    };
    assert_eq!(details.kind, SignalKind::ClosePosition);
    assert!(details.execution_spread.is_none());
    assert_eq!(details.entry_spread, Some(entry));
    assert_eq!(details.spread_change, Some(dec!(1) - entry));
    assert!(engine.position_state().entry_spread().is_none());

    assert!(engine.position_state().is_flat());
    assert_eq!(engine.position_state().trade_count(), 1);

    let positions = gateway.get_positions().await.unwrap();
    assert_eq!(positions[A], 0);
    assert_eq!(positions[B], 0);
    // +1049 - 1001 - 1001 + 999
    assert_eq!(gateway.get_pnl().await.unwrap(), Some(dec!(46)));

    let summary = engine.summary();
    assert_eq!(summary.ticks, 7);
    assert_eq!(summary.signals, 2);
    assert_eq!(summary.orders_submitted, 4);
    assert_eq!(summary.trade_count, 1);
    assert!(!summary.halted);
}

#[tokio::test]
async fn test_partial_failure_halts_until_reconciled() {
    let gateway = gateway();
    let mut engine = engine_with(&gateway, rails());
    seed_flat(&mut engine, &gateway).await;
    warm_up(&mut engine, &gateway).await;

    // Buy leg on B goes through, sell leg on A fails
    gateway.fail_orders_for(A).await;
    let action = tick(&mut engine, &gateway, dec!(105)).await.unwrap();
    let EngineAction::PartialFailure(failure) = action else {
        panic!("expected partial failure, got {action:?}");
    };
    assert_eq!(failure.completed.len(), 1);
    assert_eq!(failure.failed.instrument_id, A);

    assert!(matches!(engine.phase(), EnginePhase::Halted(_)));
    assert!(engine.position_state().is_flat());
    assert_eq!(engine.position_state().trade_count(), 0);
    assert!(engine.summary().halted);

    // No signal generation while halted
    let err = tick(&mut engine, &gateway, dec!(100)).await.unwrap_err();
    assert!(matches!(err, EngineError::Halted(_)));

    // Only B is held: ambiguous, needs confirmation
    gateway.clear_failures().await;
    let err = engine
        .reconcile_after_failure_from_gateway()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Reconcile(ReconcileError::Ambiguous(ref p)) if p.pos_a == 0 && p.pos_b == 10
    ));
    assert!(matches!(
        tick(&mut engine, &gateway, dec!(100)).await,
        Err(EngineError::AwaitingConfirmation(_))
    ));

    engine.confirm_ambiguous_start().unwrap();
    assert_eq!(*engine.phase(), EnginePhase::Running);
    assert!(tick(&mut engine, &gateway, dec!(100)).await.is_ok());
}

#[tokio::test]
async fn test_operator_flattens_after_failure() {
    let gateway = gateway();
    let mut engine = engine_with(&gateway, rails());
    seed_flat(&mut engine, &gateway).await;
    warm_up(&mut engine, &gateway).await;

    gateway.fail_orders_for(A).await;
    tick(&mut engine, &gateway, dec!(105)).await.unwrap();

    // Operator unwinds B by hand
    gateway.clear_failures().await;
    gateway.set_position(B, 0).await;
    let report = engine.reconcile_after_failure_from_gateway().await.unwrap();
    assert_eq!(report.adopted, None);
    assert_eq!(*engine.phase(), EnginePhase::Running);
}

#[tokio::test]
async fn test_tick_before_seed() {
    let gateway = gateway();
    let mut engine = engine_with(&gateway, rails());
    let err = tick(&mut engine, &gateway, dec!(100)).await.unwrap_err();
    assert!(matches!(err, EngineError::NotSeeded));
}

#[tokio::test]
async fn test_ambiguous_seed_requires_confirmation() {
    let gateway = gateway();
    gateway.set_position(A, 10).await;
    gateway.set_position(B, 10).await;
    let mut engine = engine_with(&gateway, rails());

    let (a, b) = quotes(dec!(100), dec!(100));
    gateway.set_quote(a).await;
    gateway.set_quote(b).await;
    let err = engine.seed_from_gateway().await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Reconcile(ReconcileError::Ambiguous(ref p)) if p.delta == 20
    ));

    let err = tick(&mut engine, &gateway, dec!(100)).await.unwrap_err();
    assert!(matches!(err, EngineError::AwaitingConfirmation(_)));
    assert_eq!(engine.summary().ticks, 0);

    engine.confirm_ambiguous_start().unwrap();
    assert!(engine.position_state().is_flat());
    let action = tick(&mut engine, &gateway, dec!(100)).await.unwrap();
    assert!(matches!(action, EngineAction::WarmingUp { samples: 1, .. }));
}

#[tokio::test]
async fn test_adopted_long_pair_closes_on_reversion() {
    let gateway = gateway();
    gateway.set_position(A, 10).await;
    gateway.set_position(B, -10).await;
    let mut engine = engine_with(&gateway, rails());

    let (a, b) = quotes(dec!(98), dec!(100));
    let report = engine
        .seed(&gateway.get_positions().await.unwrap(), &a, &b)
        .unwrap();
    assert_eq!(report.adopted, Some(PairSide::LongPair));
    assert_eq!(engine.position_state().entry_spread(), Some(dec!(0.98)));
    assert_eq!(engine.position_state().trade_count(), 0);

    // Statistics land on the fifth tick, centred at 1.00
    let mut last = EngineAction::NoAction;
    for mid_a in WARM_UP {
        last = tick(&mut engine, &gateway, mid_a).await.unwrap();
    }
    let EngineAction::OrderPairSubmitted(details) = last else {
        panic!("expected close, got {last:?}");
    };
    assert_eq!(details.kind, SignalKind::ClosePosition);
    assert_eq!(details.legs[0].order.side, OrderSide::Sell);
    assert_eq!(details.legs[0].order.volume, 10);
    assert_eq!(details.legs[1].order.side, OrderSide::Buy);
    assert_eq!(details.entry_spread, Some(dec!(0.98)));
    assert_eq!(details.spread_change, Some(dec!(0.02)));

    assert!(engine.position_state().is_flat());
    // Adoption and closes are not entries
    assert_eq!(engine.position_state().trade_count(), 0);
}

#[tokio::test]
async fn test_close_with_nothing_on_exchange_clears_state() {
    let gateway = gateway();
    let mut engine = engine_with(&gateway, rails());

    let (a, b) = quotes(dec!(98), dec!(100));
    let positions = HashMap::from([(A.to_string(), 10), (B.to_string(), -10)]);
    engine.seed(&positions, &a, &b).unwrap();
    assert_eq!(engine.position_state().position(), PairPosition::LongPair);

    // The gateway itself holds nothing
    let mut last = EngineAction::NoAction;
    for mid_a in WARM_UP {
        last = tick(&mut engine, &gateway, mid_a).await.unwrap();
    }
    assert_eq!(last, EngineAction::PositionCleared);
    assert!(engine.position_state().is_flat());
    assert!(gateway.fills().await.is_empty());
}

#[tokio::test]
async fn test_kill_switch_rejects_signal() {
    let gateway = gateway();
    let mut engine = engine_with(
        &gateway,
        GuardRailConfig {
            trading_enabled: false,
            ..rails()
        },
    );
    seed_flat(&mut engine, &gateway).await;
    warm_up(&mut engine, &gateway).await;

    let action = tick(&mut engine, &gateway, dec!(105)).await.unwrap();
    let EngineAction::SignalRejected(rejection) = action else {
        panic!("expected rejection, got {action:?}");
    };
    assert_eq!(rejection.reason, RejectReason::TradingDisabled);

    let summary = engine.summary();
    assert_eq!(summary.rejections.get(&RejectReason::TradingDisabled), Some(&1));
    assert_eq!(summary.orders_submitted, 0);
    assert!(gateway.fills().await.is_empty());
}

#[tokio::test]
async fn test_incomplete_book_skips_tick() {
    let gateway = gateway();
    let mut engine = engine_with(&gateway, rails());
    seed_flat(&mut engine, &gateway).await;

    let (a, mut b) = quotes(dec!(100), dec!(100));
    b.bid = None;
    let err = engine.on_tick(&a, &b).await.unwrap_err();
    assert!(matches!(err, EngineError::Data(_)));
    assert!(engine.tracker().is_empty());
    assert!(engine.summary().last_spread.is_none());
}

#[tokio::test]
async fn test_summary_serializes() {
    let gateway = gateway();
    let mut engine = engine_with(&gateway, rails());
    seed_flat(&mut engine, &gateway).await;
    warm_up(&mut engine, &gateway).await;

    let json = serde_json::to_value(engine.summary()).unwrap();
    assert_eq!(json["pair_id"], "PHILLIPS_A-PHILLIPS_B");
    assert_eq!(json["position"], "FLAT");
    assert_eq!(json["ticks"], 5);
    assert!(json["statistics"]["mean"].is_string());
}
