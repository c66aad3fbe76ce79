use serde::{Deserialize, Serialize};

use crate::discovery::DEFAULT_HIGH_VOLATILITY;
use crate::indicators::IndicatorRow;
use crate::models::{ScoredSignal, Signal};

/// Configuration for signal generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalConfig {
    pub min_candles: usize,
    pub buy_threshold: u32,  // Minimum buy score for BUY
    pub sell_threshold: u32, // Minimum sell score for SELL
    pub high_volatility_assets: Vec<String>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_candles: 50,
            buy_threshold: 8,
            sell_threshold: 4,
            high_volatility_assets: DEFAULT_HIGH_VOLATILITY
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SignalConfig {
    /// Whether the symbol contains any high-volatility asset name
    ///
    /// Matches pair symbols with or without a separator ("SOL/USDT", "SOLUSDT").
    pub fn is_high_volatility(&self, token: &str) -> bool {
        let symbol = token.to_ascii_uppercase();
        self.high_volatility_assets
            .iter()
            .any(|asset| symbol.contains(&asset.to_ascii_uppercase()))
    }
}

/// Latest-row indicator values with every field guaranteed finite
///
/// Values that are NaN or infinite are replaced by neutral defaults:
/// 50 for oscillators, 0 for MACD / momentum / price change, 1 for the
/// volume ratio and the close for moving averages and bands (close itself
/// falls back to 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub ma_10: f64,
    pub ma_20: f64,
    pub ma_50: f64,
    pub rsi_7: f64,
    pub rsi_14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub volume_ratio: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub momentum: f64,
    pub price_change: f64,
}

fn safe(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

impl IndicatorSnapshot {
    pub fn from_row(row: &IndicatorRow) -> Self {
        let close = safe(row.close, 0.0);

        Self {
            close,
            ma_10: safe(row.ma_10, close),
            ma_20: safe(row.ma_20, close),
            ma_50: safe(row.ma_50, close),
            rsi_7: safe(row.rsi_7, 50.0),
            rsi_14: safe(row.rsi_14, 50.0),
            macd: safe(row.macd, 0.0),
            macd_signal: safe(row.macd_signal, 0.0),
            volume_ratio: safe(row.volume_ratio, 1.0),
            bb_upper: safe(row.bb_upper, close),
            bb_middle: safe(row.bb_middle, close),
            stoch_k: safe(row.stoch_k, 50.0),
            stoch_d: safe(row.stoch_d, 50.0),
            momentum: safe(row.momentum, 0.0),
            price_change: safe(row.price_change, 0.0),
        }
    }
}

/// Facts about the instrument that are not in the indicator row
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RuleContext {
    pub entry_price: Option<f64>, // Open position entry, if any
    pub stop_loss: Option<f64>,
    pub high_volatility: bool,
}

/// One weighted rule of the rulebook
#[derive(Clone, Copy)]
pub struct Criterion {
    pub name: &'static str,
    pub weight: u32,
    pub holds: fn(&IndicatorSnapshot, &RuleContext) -> bool,
}

impl std::fmt::Debug for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.weight)
    }
}

pub const BUY_CRITERIA: [Criterion; 8] = [
    Criterion {
        name: "trend_alignment",
        weight: 2,
        holds: |s, _| s.ma_10 > s.ma_20 && s.ma_20 > s.ma_50,
    },
    Criterion {
        name: "rsi_not_extreme",
        weight: 2,
        holds: |s, _| s.rsi_7 > 30.0 && s.rsi_7 < 80.0,
    },
    Criterion {
        name: "macd_bullish",
        weight: 2,
        holds: |s, _| s.macd > s.macd_signal,
    },
    Criterion {
        name: "volume_elevated",
        weight: 2,
        holds: |s, _| s.volume_ratio > 1.2,
    },
    Criterion {
        name: "upper_band_breakout",
        weight: 2,
        holds: |s, _| s.close > s.bb_upper * 0.98,
    },
    Criterion {
        name: "stochastic_rising",
        weight: 2,
        holds: |s, _| s.stoch_k > s.stoch_d && s.stoch_k < 80.0,
    },
    Criterion {
        name: "positive_momentum",
        weight: 2,
        holds: |s, _| s.momentum > 0.0,
    },
    Criterion {
        name: "no_sharp_decline",
        weight: 2,
        holds: |s, _| s.price_change > -0.02,
    },
];

/// Extra buy points for high-volatility instruments
pub const BONUS_CRITERIA: [Criterion; 2] = [
    Criterion {
        name: "volume_surge",
        weight: 2,
        holds: |s, ctx| ctx.high_volatility && s.volume_ratio > 1.5,
    },
    Criterion {
        name: "strong_move",
        weight: 1,
        holds: |s, ctx| ctx.high_volatility && s.price_change.abs() > 0.05,
    },
];

pub const SELL_CRITERIA: [Criterion; 8] = [
    Criterion {
        name: "trend_reversal",
        weight: 1,
        holds: |s, _| s.ma_10 < s.ma_20,
    },
    Criterion {
        name: "overbought",
        weight: 1,
        holds: |s, _| s.rsi_14 > 75.0,
    },
    Criterion {
        name: "macd_bearish",
        weight: 1,
        holds: |s, _| s.macd < s.macd_signal,
    },
    Criterion {
        name: "volume_drying_up",
        weight: 1,
        holds: |s, _| s.volume_ratio < 0.8,
    },
    Criterion {
        name: "below_middle_band",
        weight: 1,
        holds: |s, _| s.close < s.bb_middle,
    },
    Criterion {
        name: "stochastic_falling",
        weight: 1,
        holds: |s, _| s.stoch_k < s.stoch_d,
    },
    Criterion {
        name: "negative_momentum",
        weight: 1,
        holds: |s, _| s.momentum < 0.0,
    },
    // Overlaps the position manager's take-profit exit; both stay active
    Criterion {
        name: "profit_lock",
        weight: 1,
        holds: |s, ctx| ctx.entry_price.is_some_and(|entry| s.close >= entry * 1.08),
    },
];

/// Sum the weights of the criteria that hold
pub fn score_criteria(
    criteria: &[Criterion],
    snapshot: &IndicatorSnapshot,
    ctx: &RuleContext,
) -> u32 {
    criteria
        .iter()
        .filter(|c| (c.holds)(snapshot, ctx))
        .map(|c| c.weight)
        .sum()
}

/// Buy and sell scores for one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalScores {
    pub buy: u32,
    pub sell: u32,
}

pub fn calculate_scores(snapshot: &IndicatorSnapshot, ctx: &RuleContext) -> SignalScores {
    SignalScores {
        buy: score_criteria(&BUY_CRITERIA, snapshot, ctx)
            + score_criteria(&BONUS_CRITERIA, snapshot, ctx),
        sell: score_criteria(&SELL_CRITERIA, snapshot, ctx),
    }
}

/// Turn a snapshot into a decision
///
/// Precedence: BUY when the buy score reaches its threshold, then SELL when
/// the sell score reaches its threshold or the close is at or below the open
/// position's stop, otherwise HOLD with strength 0.
pub fn evaluate_snapshot(
    snapshot: &IndicatorSnapshot,
    ctx: &RuleContext,
    config: &SignalConfig,
) -> ScoredSignal {
    let scores = calculate_scores(snapshot, ctx);
    let stop_hit = ctx.stop_loss.is_some_and(|stop| snapshot.close <= stop);

    tracing::debug!(
        buy_score = scores.buy,
        sell_score = scores.sell,
        close = snapshot.close,
        rsi_7 = snapshot.rsi_7,
        rsi_14 = snapshot.rsi_14,
        volume_ratio = snapshot.volume_ratio,
        "Signal scores"
    );

    if scores.buy >= config.buy_threshold {
        ScoredSignal::new(Signal::Buy, scores.buy)
    } else if scores.sell >= config.sell_threshold || stop_hit {
        ScoredSignal::new(Signal::Sell, scores.sell)
    } else {
        ScoredSignal::hold()
    }
}
