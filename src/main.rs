use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tradebot::backtest::{MarketScenario, SyntheticDataGenerator};
use tradebot::config::BotConfig;
use tradebot::execution::CandleBuffer;
use tradebot::persistence::LogRecorder;
use tradebot::session::SessionController;

#[derive(Parser)]
#[command(name = "tradebot", about = "Signal-driven paper trading engine")]
struct Cli {
    /// Config file (defaults to ./tradebot.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Paper-trade the universe over synthetic candles until Ctrl-C or drawdown halt
    Simulate {
        #[arg(long, value_enum, default_value_t = MarketScenario::Breakout)]
        scenario: MarketScenario,

        /// Candles generated per instrument
        #[arg(long, default_value_t = 300)]
        candles: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Milliseconds between cycles
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,
    },
    /// Score the universe once and print the ranked candidates
    Rank {
        #[arg(long, value_enum, default_value_t = MarketScenario::Volatile)]
        scenario: MarketScenario,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config = BotConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Simulate {
            scenario,
            candles,
            seed,
            interval_ms,
        } => simulate(config, scenario, candles, seed, interval_ms).await,
        Command::Rank { scenario, seed } => rank(config, scenario, seed).await,
    }
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tradebot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// One synthetic history per instrument, each with its own seed and base price
fn synthetic_market(
    config: &BotConfig,
    scenario: MarketScenario,
    candles: usize,
    seed: u64,
) -> Vec<Vec<tradebot::Candle>> {
    config
        .session
        .universe
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let base_price = 10.0 * (i as f64 + 1.0);
            SyntheticDataGenerator::new(seed + i as u64)
                .with_base_price(base_price)
                .generate(token, scenario, candles, 60)
        })
        .collect()
}

async fn simulate(
    config: BotConfig,
    scenario: MarketScenario,
    candles: usize,
    seed: u64,
    interval_ms: u64,
) -> Result<()> {
    let warmup = config.signal.min_candles;
    anyhow::ensure!(
        candles > warmup,
        "need more than {} candles per instrument, got {}",
        warmup,
        candles
    );

    tracing::info!("🚀 Simulating {} over {} instruments", scenario.label(), config.session.universe.len());
    tracing::info!("  Initial Balance: ${:.2}", config.initial_balance);
    tracing::info!("  Risk Per Trade: {}%", config.risk.risk_per_trade * 100.0);
    tracing::info!("  Max Drawdown: {}%", config.risk.max_drawdown * 100.0);

    let series = synthetic_market(&config, scenario, candles, seed);
    let buffer = CandleBuffer::new(config.session.candle_limit.max(warmup));
    for history in &series {
        buffer.extend(history[..warmup].iter().cloned());
    }

    // Feed one new candle per instrument each interval, ahead of the session's own ticks
    let feeder = {
        let buffer = buffer.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            for step in warmup..candles {
                ticker.tick().await;
                for history in &series {
                    buffer.add_candle(history[step].clone());
                }
            }
            tracing::info!("📭 Synthetic feed exhausted");
        })
    };

    let mut session = SessionController::new(&config, buffer, LogRecorder)
        .with_poll_interval(Duration::from_millis(interval_ms));

    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Ctrl-C received"),
            _ = feeder => {}
        }
    };

    let snapshot = session.run(shutdown).await;

    println!("\n📊 Session summary");
    println!("  Cycles:        {}", session.cycles());
    println!("  Balance:       ${:.2}", snapshot.balance);
    println!("  Total Profit:  ${:+.2}", snapshot.total_profit);
    println!(
        "  Trades:        {} ({} winning, {:.1}%)",
        snapshot.total_trades, snapshot.winning_trades, snapshot.win_rate
    );
    println!("  Open:          {}", snapshot.open_positions);
    for performer in &snapshot.best_performers {
        println!(
            "  🏆 {}: ${:+.2} over {} trades",
            performer.token, performer.total_profit, performer.closed_trades
        );
    }

    Ok(())
}

async fn rank(config: BotConfig, scenario: MarketScenario, seed: u64) -> Result<()> {
    let limit = config.session.candle_limit;
    let buffer = CandleBuffer::new(limit);
    for history in synthetic_market(&config, scenario, limit, seed) {
        buffer.extend(history);
    }

    let session = SessionController::new(&config, buffer, LogRecorder);
    let ranked = session.rank_opportunities().await;

    println!("\n🔍 Top {} opportunities ({})", config.session.top_n, scenario.label());
    if ranked.is_empty() {
        println!("  No instrument scored above {}", config.session.min_potential);
    }
    for (i, opportunity) in ranked.iter().enumerate() {
        println!(
            "  {}. {:<10} score {:>5.1}  price ${:.4}",
            i + 1,
            opportunity.token,
            opportunity.score,
            opportunity.price
        );
    }
    println!("  (as of {})", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));

    Ok(())
}
