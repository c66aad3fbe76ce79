use crate::indicators::series::{finite, mean_defined, pct_change};
use crate::indicators::{latest_rsi, RSI_DEFAULT};
use crate::models::Candle;

/// Minimum candles needed before an instrument can be scored
pub const MIN_CANDLES_FOR_SCORE: usize = 50;

/// Volatility assumed when the range ratio cannot be computed
const DEFAULT_VOLATILITY: f64 = 0.02;

const VOLATILITY_WEIGHT: f64 = 1000.0;
const VOLUME_TREND_WEIGHT: f64 = 500.0;
const PRICE_TREND_WEIGHT: f64 = 1000.0;
const RSI_BALANCE_WEIGHT: f64 = 0.5;

/// Breakdown of an opportunity score, all terms already defaulted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotentialTerms {
    pub volatility: f64,
    pub volume_trend: f64,
    pub price_trend: f64,
    pub rsi: f64,
}

impl PotentialTerms {
    /// Weighted sum clamped to [0, 100]; a non-finite total scores 0
    pub fn score(&self) -> f64 {
        let raw = self.volatility * VOLATILITY_WEIGHT
            + self.volume_trend * VOLUME_TREND_WEIGHT
            + self.price_trend.abs() * PRICE_TREND_WEIGHT
            + (50.0 - (50.0 - self.rsi).abs()) * RSI_BALANCE_WEIGHT;

        finite(raw).map(|v| v.clamp(0.0, 100.0)).unwrap_or(0.0)
    }
}

/// Extract the score terms from a candle window
///
/// Returns None when there are fewer than 50 candles.
pub fn potential_terms(candles: &[Candle]) -> Option<PotentialTerms> {
    if candles.len() < MIN_CANDLES_FOR_SCORE {
        return None;
    }

    let ranges: Vec<Option<f64>> = candles
        .iter()
        .map(|c| finite((c.high - c.low) / c.close))
        .collect();

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    let rsi = latest_rsi(&closes, 14);

    Some(PotentialTerms {
        volatility: mean_defined(&ranges).unwrap_or(DEFAULT_VOLATILITY),
        volume_trend: mean_defined(&pct_change(&volumes, 5)).unwrap_or(0.0),
        price_trend: mean_defined(&pct_change(&closes, 10)).unwrap_or(0.0),
        rsi: finite(rsi).unwrap_or(RSI_DEFAULT),
    })
}

/// Opportunity score in [0, 100] used to rank instruments and scale size
///
/// Rewards intrabar volatility, rising volume, a directional drift in either
/// direction and an RSI near the middle of its range. Fewer than 50 candles
/// score 0.
pub fn opportunity_score(candles: &[Candle]) -> f64 {
    potential_terms(candles)
        .map(|terms| terms.score())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn create_test_candles(n: usize, range_pct: f64, volume: impl Fn(usize) -> f64) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let price = 100.0 + (i % 2) as f64;
                Candle {
                    token: "TEST".to_string(),
                    timestamp: Utc::now() + chrono::Duration::hours(i as i64),
                    open: price,
                    high: price * (1.0 + range_pct / 2.0),
                    low: price * (1.0 - range_pct / 2.0),
                    close: price,
                    volume: volume(i),
                }
            })
            .collect()
    }

    #[test]
    fn test_insufficient_candles_score_zero() {
        let candles = create_test_candles(49, 0.05, |_| 1000.0);
        assert_eq!(opportunity_score(&candles), 0.0);
        assert!(potential_terms(&candles).is_none());
    }

    #[test]
    fn test_quiet_market_scores_low() {
        // 0.2% range, flat volume, oscillating price
        let candles = create_test_candles(100, 0.002, |_| 1000.0);
        let terms = potential_terms(&candles).unwrap();

        assert_relative_eq!(terms.volatility, 0.002, epsilon = 1e-9);
        assert_relative_eq!(terms.volume_trend, 0.0, epsilon = 1e-12);
        assert!(terms.price_trend.abs() < 1e-3);

        let score = terms.score();
        assert!(score > 0.0 && score < 40.0, "score was {}", score);
    }

    #[test]
    fn test_volatile_market_is_capped() {
        let candles = create_test_candles(100, 0.2, |_| 1000.0);
        assert_eq!(opportunity_score(&candles), 100.0);
    }

    #[test]
    fn test_score_formula() {
        let terms = PotentialTerms {
            volatility: 0.03,
            volume_trend: 0.02,
            price_trend: -0.01,
            rsi: 60.0,
        };
        // 30 + 10 + 10 + 20
        assert_relative_eq!(terms.score(), 70.0, epsilon = 1e-9);
    }

    #[test]
    fn test_collapsing_volume_clamps_to_zero() {
        let terms = PotentialTerms {
            volatility: 0.001,
            volume_trend: -0.5,
            price_trend: 0.0,
            rsi: 50.0,
        };
        assert_eq!(terms.score(), 0.0);
    }

    #[test]
    fn test_zero_close_candles_fall_back_to_defaults() {
        let mut candles = create_test_candles(60, 0.01, |_| 1000.0);
        for candle in candles.iter_mut() {
            candle.close = 0.0;
        }
        let terms = potential_terms(&candles).unwrap();
        assert_eq!(terms.volatility, DEFAULT_VOLATILITY);
        assert_eq!(terms.price_trend, 0.0);
    }
}
