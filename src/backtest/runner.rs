use crate::backtest::metrics::BacktestMetrics;
use crate::config::BotConfig;
use crate::error::BotError;
use crate::execution::CandleBuffer;
use crate::models::Candle;
use crate::persistence::MemoryRecorder;
use crate::session::SessionController;
use crate::Result;
use std::collections::HashMap;

/// Replays candle histories through a full session, one candle per cycle
pub struct BacktestRunner {
    config: BotConfig,
}

impl BacktestRunner {
    pub fn new(config: BotConfig) -> Self {
        Self { config }
    }

    /// Candles pre-loaded before the first cycle
    pub fn warmup(&self) -> usize {
        self.config.signal.min_candles
    }

    /// Run a replay over one candle series per instrument
    ///
    /// Every series is trimmed to the shortest one; the universe is the set of
    /// instruments in `series`. Positions still open at the end are marked at
    /// their last close.
    pub async fn run(&self, series: Vec<Vec<Candle>>) -> Result<BacktestMetrics> {
        let steps = series.iter().map(|s| s.len()).min().unwrap_or(0);
        let warmup = self.warmup();

        if series.is_empty() || steps <= warmup {
            return Err(BotError::InsufficientData {
                token: series
                    .first()
                    .and_then(|s| s.first())
                    .map(|c| c.token.clone())
                    .unwrap_or_default(),
                bars: steps,
                minimum: warmup + 1,
            });
        }

        let mut config = self.config.clone();
        config.session.universe = series
            .iter()
            .filter_map(|s| s.first().map(|c| c.token.clone()))
            .collect();

        tracing::info!(
            instruments = config.session.universe.len(),
            steps,
            warmup,
            "Starting replay"
        );

        let buffer = CandleBuffer::new(config.session.candle_limit.max(warmup));
        for candles in &series {
            buffer.extend(candles[..warmup].iter().cloned());
        }

        let mut session = SessionController::new(&config, buffer.clone(), MemoryRecorder::new());
        let mut halted_cycles = 0;

        for i in warmup..steps {
            for candles in &series {
                buffer.add_candle(candles[i].clone());
            }

            let now = series[0][i].timestamp;
            let report = session.run_cycle(now).await;
            if report.halted {
                halted_cycles += 1;
            }
        }

        let last_prices: HashMap<String, f64> = series
            .iter()
            .filter_map(|s| s.get(steps - 1).map(|c| (c.token.clone(), c.close)))
            .collect();

        let pm = session.positions();
        let metrics = BacktestMetrics::from_trades(
            pm.trades(),
            pm.equity_curve(),
            pm.account().initial_balance,
            pm.portfolio_value(&last_prices),
            pm.open_positions().len(),
            halted_cycles,
        );

        tracing::info!(
            trades = metrics.total_trades,
            pnl = metrics.total_pnl,
            return_pct = metrics.total_return_pct,
            "Replay complete"
        );

        Ok(metrics)
    }
}
