use anyhow::Result;
use clap::Parser;
use tradebot::backtest::{BacktestMetrics, BacktestRunner, MarketScenario, SyntheticDataGenerator};
use tradebot::config::BotConfig;

#[derive(Parser)]
#[command(name = "backtest", about = "Replay every synthetic scenario and compare results")]
struct Args {
    /// Instruments replayed side by side in each scenario
    #[arg(long, default_value = "SOL/USDT,ETH/USDT,AVAX/USDT", value_delimiter = ',')]
    tokens: Vec<String>,

    #[arg(long, default_value_t = 400)]
    candles: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print the full report for each scenario
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("tradebot=warn")
        .init();

    let args = Args::parse();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║           TRADEBOT BACKTESTING SUITE                  ║");
    println!("╚═══════════════════════════════════════════════════════╝");

    let config = BotConfig::load(None)?;
    let runner = BacktestRunner::new(config);
    let mut all_metrics = Vec::new();

    for scenario in MarketScenario::ALL {
        let series = args
            .tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                SyntheticDataGenerator::new(args.seed + i as u64)
                    .with_base_price(20.0 * (i as f64 + 1.0))
                    .generate(token, scenario, args.candles, 60)
            })
            .collect();

        println!("\n🔬 Running backtest: {}", scenario.label());
        match runner.run(series).await {
            Ok(metrics) => {
                if args.verbose {
                    metrics.print_report();
                }
                all_metrics.push((scenario.label().to_string(), metrics));
            }
            Err(e) => {
                eprintln!("❌ Backtest failed for {}: {}", scenario.label(), e);
            }
        }
    }

    print_summary_comparison(&all_metrics);

    Ok(())
}

fn print_summary_comparison(results: &[(String, BacktestMetrics)]) {
    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              SCENARIO COMPARISON                      ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!(
        "{:<28} {:>10} {:>10} {:>8} {:>8} {:>8}",
        "Scenario", "P&L", "Return%", "Trades", "Win%", "MaxDD%"
    );
    println!("{}", "─".repeat(76));

    for (name, metrics) in results {
        println!(
            "{:<28} {:>10.2} {:>10.2} {:>8} {:>8.1} {:>8.2}",
            name,
            metrics.total_pnl,
            metrics.total_return_pct,
            metrics.total_trades,
            metrics.win_rate,
            metrics.max_drawdown_pct
        );
    }

    println!("\n");

    if let Some((best_name, best)) = results
        .iter()
        .max_by(|a, b| a.1.total_return_pct.total_cmp(&b.1.total_return_pct))
    {
        println!(
            "🏆 Best Scenario: {} ({:+.2}%)",
            best_name, best.total_return_pct
        );
    }

    if let Some((worst_name, worst)) = results
        .iter()
        .min_by(|a, b| a.1.total_return_pct.total_cmp(&b.1.total_return_pct))
    {
        println!(
            "⚠️  Worst Scenario: {} ({:+.2}%)",
            worst_name, worst.total_return_pct
        );
    }

    let total_trades: usize = results.iter().map(|(_, m)| m.total_trades).sum();
    println!("\n📊 Total Trades Across All Scenarios: {}", total_trades);
    println!("\n═══════════════════════════════════════════════════════\n");
}
