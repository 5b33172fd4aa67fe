use anyhow::Context;
use clap::Parser;
use pairs_guard::cli::{Cli, Commands};
use pairs_guard::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)
        .with_context(|| format!("Could not load config from {}", cli.config))?;

    // Initialize telemetry
    let _telemetry = pairs_guard::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Replay(args) => {
            tracing::info!(input = %args.input.display(), pair = %config.pair.pair_id(), "Starting replay");
            args.execute(&config).await?;
        }
        Commands::Config => {
            let rails = &config.guard_rail;
            println!("Current configuration:");
            println!(
                "  Pair: {} ({} / {})",
                config.pair.pair_id(),
                config.pair.instrument_a,
                config.pair.instrument_b
            );
            println!(
                "  Window: {} samples, {} to start",
                config.tracker.window, config.tracker.min_samples
            );
            println!(
                "  Bands: entry={}σ exit={}σ parity={}",
                rails.entry_stdev_multiplier,
                rails.exit_stdev_multiplier,
                rails
                    .theoretical_parity
                    .map_or("empirical".to_string(), |p| p.to_string())
            );
            println!(
                "  Size: {} per leg, limit ±{}",
                rails.max_position_size,
                rails.effective_position_limit()
            );
            println!("  Trading enabled: {}", rails.trading_enabled);
        }
    }

    Ok(())
}
