use super::{
    signals::{evaluate_snapshot, IndicatorSnapshot, RuleContext, SignalConfig},
    Strategy,
};
use crate::execution::Position;
use crate::indicators::IndicatorFrame;
use crate::models::ScoredSignal;

/// Multi-criteria confluence strategy
///
/// Scores the latest candle against a fixed rulebook:
/// - Trend alignment, MACD and Stochastic direction for entries
/// - Volume expansion and upper-band proximity for breakout confirmation
/// - Reversal, exhaustion and profit-lock rules for exits
///
/// Buy criteria are worth 2 points, sell criteria 1 point.
#[derive(Debug, Clone, Default)]
pub struct ConfluenceStrategy {
    config: SignalConfig,
}

impl ConfluenceStrategy {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}

impl Strategy for ConfluenceStrategy {
    fn generate_signal(
        &self,
        frame: &IndicatorFrame,
        token: &str,
        position: Option<&Position>,
    ) -> ScoredSignal {
        if frame.len() < self.min_candles_required() {
            tracing::debug!(
                token = %token,
                candles = frame.len(),
                needed = self.min_candles_required(),
                "Not enough candles to evaluate"
            );
            return ScoredSignal::hold();
        }

        let Some(row) = frame.latest() else {
            return ScoredSignal::hold();
        };

        let snapshot = IndicatorSnapshot::from_row(row);
        let ctx = RuleContext {
            entry_price: position.map(|p| p.entry_price),
            stop_loss: position.map(|p| p.stop_loss),
            high_volatility: self.config.is_high_volatility(token),
        };

        evaluate_snapshot(&snapshot, &ctx, &self.config)
    }

    fn name(&self) -> &str {
        "ConfluenceStrategy"
    }

    fn min_candles_required(&self) -> usize {
        self.config.min_candles
    }
}
