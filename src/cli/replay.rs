//! Replay command implementation

use crate::config::Config;
use crate::engine::{EngineAction, EngineError, EnginePhase, PairsEngine};
use crate::execution::{MarketGateway, PaperGateway};
use crate::orderbook::Quote;
use crate::risk::ReconcileError;
use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file, one `{"a": Quote, "b": Quote}` per line
    pub input: PathBuf,

    /// Starting position in instrument A
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub position_a: i64,

    /// Starting position in instrument B
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub position_b: i64,

    /// Start flat even if the starting positions are not a pair
    #[arg(long)]
    pub confirm_ambiguous: bool,
}

/// One line of the replay file
#[derive(Debug, Deserialize)]
pub struct TickRecord {
    pub a: Quote,
    pub b: Quote,
}

impl ReplayArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let gateway = Arc::new(PaperGateway::new(
            config.paper.initial_cash,
            config.paper.fee_rate,
        ));
        gateway
            .set_position(&config.pair.instrument_a, self.position_a)
            .await;
        gateway
            .set_position(&config.pair.instrument_b, self.position_b)
            .await;

        let mut engine = PairsEngine::from_config(Arc::clone(&gateway), config);

        let file = tokio::fs::File::open(&self.input)
            .await
            .with_context(|| format!("Failed to open {}", self.input.display()))?;
        let mut lines = BufReader::new(file).lines();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let tick: TickRecord = serde_json::from_str(&line)
                .with_context(|| format!("Invalid tick on line {line_no}"))?;
            self.check_instruments(config, &tick, line_no)?;

            gateway.set_quote(tick.a.clone()).await;
            gateway.set_quote(tick.b.clone()).await;

            if *engine.phase() == EnginePhase::Unseeded && !self.seed(&mut engine).await? {
                continue;
            }

            match engine.on_tick(&tick.a, &tick.b).await {
                Ok(EngineAction::PartialFailure(failure)) => {
                    tracing::error!(line = line_no, error = %failure.error, "Replay halted");
                    break;
                }
                Ok(action) => {
                    tracing::debug!(line = line_no, ?action, "Tick processed");
                }
                Err(EngineError::Data(e)) => {
                    tracing::warn!(line = line_no, error = %e, "Tick skipped");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let summary = engine.summary();
        println!("{}", serde_json::to_string_pretty(&summary)?);
        match gateway.get_pnl().await? {
            Some(pnl) => println!("P&L: {pnl}"),
            None => println!("P&L: unavailable"),
        }

        Ok(())
    }

    /// Seed the engine; `false` means retry on the next tick
    async fn seed(&self, engine: &mut PairsEngine<PaperGateway>) -> anyhow::Result<bool> {
        match engine.seed_from_gateway().await {
            Ok(report) => {
                tracing::info!(
                    pos_a = report.pos_a,
                    pos_b = report.pos_b,
                    adopted = ?report.adopted,
                    "Engine seeded"
                );
                Ok(true)
            }
            Err(EngineError::Reconcile(ReconcileError::Ambiguous(ambiguous))) => {
                if !self.confirm_ambiguous {
                    anyhow::bail!("{ambiguous}; rerun with --confirm-ambiguous to start flat");
                }
                engine.confirm_ambiguous_start()?;
                Ok(true)
            }
            Err(EngineError::Reconcile(ReconcileError::Data(e))) | Err(EngineError::Data(e)) => {
                tracing::warn!(error = %e, "Cannot seed on this tick");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn check_instruments(
        &self,
        config: &Config,
        tick: &TickRecord,
        line_no: usize,
    ) -> anyhow::Result<()> {
        let pair = &config.pair;
        if tick.a.instrument_id != pair.instrument_a || tick.b.instrument_id != pair.instrument_b {
            anyhow::bail!(
                "Line {line_no}: expected {}/{}, got {}/{}",
                pair.instrument_a,
                pair.instrument_b,
                tick.a.instrument_id,
                tick.b.instrument_id
            );
        }
        Ok(())
    }
}
