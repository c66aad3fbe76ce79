use crate::execution::EquityPoint;
use crate::models::{ExitReason, TradeRecord};
use serde::{Deserialize, Serialize};

/// Performance summary of a replayed session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    // P&L Metrics
    pub total_pnl: f64,
    pub total_return_pct: f64,
    pub initial_balance: f64,
    pub final_equity: f64,

    // Trade Statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub open_at_end: usize,

    // P&L Distribution
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub profit_factor: f64, // Total wins / Total losses

    // Exits
    pub stop_losses: usize,
    pub trailing_stops: usize,
    pub take_profits: usize,
    pub strategy_sells: usize,

    // Risk Metrics
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub halted_cycles: usize,

    pub avg_holding_hours: f64,
}

impl BacktestMetrics {
    /// Calculate metrics from the trade log and equity curve
    pub fn from_trades(
        trades: &[TradeRecord],
        equity_curve: &[EquityPoint],
        initial_balance: f64,
        final_equity: f64,
        open_at_end: usize,
        halted_cycles: usize,
    ) -> Self {
        let closes: Vec<&TradeRecord> = trades.iter().filter(|t| t.is_close()).collect();
        let pnls: Vec<f64> = closes.iter().map(|t| t.realized_pnl()).collect();

        let total_trades = closes.len();
        let total_pnl: f64 = pnls.iter().sum();
        let total_return_pct = if initial_balance > 0.0 {
            (final_equity - initial_balance) / initial_balance * 100.0
        } else {
            0.0
        };

        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p <= 0.0).collect();

        let win_rate = if total_trades > 0 {
            wins.len() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let total_wins: f64 = wins.iter().sum();
        let total_losses: f64 = losses.iter().map(|l| l.abs()).sum();

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let count_exit = |reason: ExitReason| {
            closes
                .iter()
                .filter(|t| t.exit_reason == Some(reason))
                .count()
        };

        let hold_hours: Vec<f64> = closes.iter().filter_map(|t| t.hold_duration_hours).collect();
        let (max_drawdown, max_drawdown_pct) = Self::calculate_drawdown(equity_curve, initial_balance);

        Self {
            total_pnl,
            total_return_pct,
            initial_balance,
            final_equity,
            total_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate,
            open_at_end,
            avg_win: average(&wins),
            avg_loss: average(&losses).abs(),
            largest_win: wins.iter().copied().fold(0.0, f64::max),
            largest_loss: losses.iter().copied().fold(0.0, f64::min),
            profit_factor,
            stop_losses: count_exit(ExitReason::StopLoss),
            trailing_stops: count_exit(ExitReason::TrailingStop),
            take_profits: count_exit(ExitReason::TakeProfit),
            strategy_sells: count_exit(ExitReason::StrategySell),
            max_drawdown,
            max_drawdown_pct,
            halted_cycles,
            avg_holding_hours: average(&hold_hours),
        }
    }

    /// Largest peak-to-trough fall of the equity curve
    fn calculate_drawdown(equity_curve: &[EquityPoint], initial_value: f64) -> (f64, f64) {
        let mut peak = initial_value;
        let mut max_dd = 0.0;
        let mut max_dd_pct = 0.0;

        for point in equity_curve {
            peak = peak.max(point.value);
            let drawdown = peak - point.value;
            if drawdown > max_dd {
                max_dd = drawdown;
                max_dd_pct = if peak > 0.0 { drawdown / peak * 100.0 } else { 0.0 };
            }
        }

        (max_dd, max_dd_pct)
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              BACKTEST PERFORMANCE REPORT              ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("📊 P&L SUMMARY");
        println!("  Initial Balance:       ${:.2}", self.initial_balance);
        println!("  Final Equity:          ${:.2}", self.final_equity);
        println!(
            "  Realized P&L:          ${:.2} ({:+.2}% equity)",
            self.total_pnl, self.total_return_pct
        );

        println!("\n📈 TRADE STATISTICS");
        println!("  Closed Trades:         {}", self.total_trades);
        println!(
            "  Winning Trades:        {} ({:.1}%)",
            self.winning_trades, self.win_rate
        );
        println!("  Losing Trades:         {}", self.losing_trades);
        println!("  Still Open:            {}", self.open_at_end);

        if self.total_trades > 0 {
            println!("\n💰 WIN/LOSS ANALYSIS");
            println!("  Average Win:           ${:.2}", self.avg_win);
            println!("  Average Loss:          ${:.2}", self.avg_loss);
            println!("  Largest Win:           ${:.2}", self.largest_win);
            println!("  Largest Loss:          ${:.2}", self.largest_loss);
            println!("  Profit Factor:         {:.2}", self.profit_factor);
            println!("  Average Hold:          {:.1} hours", self.avg_holding_hours);

            println!("\n🚪 EXITS");
            println!("  Stop Loss:             {}", self.stop_losses);
            println!("  Trailing Stop:         {}", self.trailing_stops);
            println!("  Take Profit:           {}", self.take_profits);
            println!("  Strategy Sell:         {}", self.strategy_sells);
        }

        println!("\n⚠️  RISK METRICS");
        println!(
            "  Max Drawdown:          ${:.2} ({:.2}%)",
            self.max_drawdown, self.max_drawdown_pct
        );
        println!("  Halted Cycles:         {}", self.halted_cycles);

        println!("\n═══════════════════════════════════════════════════════\n");
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
