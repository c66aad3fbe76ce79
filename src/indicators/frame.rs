use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bollinger::calculate_bollinger;
use super::macd::calculate_macd;
use super::momentum::{momentum_series, price_change_series};
use super::moving_average::sma_series;
use super::rsi::rsi_series;
use super::stochastic::calculate_stochastic;
use super::volume::calculate_volume_profile;
use crate::models::Candle;

/// Window sizes for the indicator frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ma_short: usize,
    pub ma_medium: usize,
    pub ma_long: usize,
    pub ma_trend: usize,
    pub rsi_period: usize,
    pub rsi_fast_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_width: f64,
    pub stochastic_period: usize,
    pub stochastic_smoothing: usize,
    pub volume_period: usize,
    pub momentum_lag: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_short: 10,
            ma_medium: 20,
            ma_long: 50,
            ma_trend: 100,
            rsi_period: 14,
            rsi_fast_period: 7,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_width: 2.0,
            stochastic_period: 14,
            stochastic_smoothing: 3,
            volume_period: 20,
            momentum_lag: 5,
        }
    }
}

/// One candle with every derived indicator value
///
/// Derived fields are always populated. During warmup they hold the neutral
/// default for their kind: close for price-like fields, 50 for oscillators,
/// 0 for MACD / momentum, 1 for the volume ratio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ma_10: f64,
    pub ma_20: f64,
    pub ma_50: f64,
    pub ma_100: f64,
    pub rsi_14: f64,
    pub rsi_7: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub volume_ma: f64,
    pub volume_ratio: f64,
    pub momentum: f64,
    pub price_change: f64,
}

/// Candles enriched with indicators, one row per input candle
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    token: String,
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    /// Compute the frame with default windows
    pub fn compute(candles: &[Candle]) -> Self {
        Self::compute_with(candles, &IndicatorConfig::default())
    }

    /// Compute the frame with explicit windows
    ///
    /// Each indicator degrades to its own defaults independently; a bad
    /// value in one series never blanks another.
    pub fn compute_with(candles: &[Candle], config: &IndicatorConfig) -> Self {
        let token = candles
            .first()
            .map(|c| c.token.clone())
            .unwrap_or_default();

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        let ma_10 = sma_series(&closes, config.ma_short);
        let ma_20 = sma_series(&closes, config.ma_medium);
        let ma_50 = sma_series(&closes, config.ma_long);
        let ma_100 = sma_series(&closes, config.ma_trend);
        let rsi_14 = rsi_series(&closes, config.rsi_period);
        let rsi_7 = rsi_series(&closes, config.rsi_fast_period);
        let macd = calculate_macd(
            &closes,
            config.macd_fast,
            config.macd_slow,
            config.macd_signal,
        );
        let bands = calculate_bollinger(&closes, config.bollinger_period, config.bollinger_width);
        let stoch = calculate_stochastic(
            candles,
            config.stochastic_period,
            config.stochastic_smoothing,
        );
        let volume = calculate_volume_profile(&volumes, &closes, config.volume_period);
        let momentum = momentum_series(&closes, config.momentum_lag);
        let price_change = price_change_series(&closes, config.momentum_lag);

        let rows = candles
            .iter()
            .enumerate()
            .map(|(i, candle)| IndicatorRow {
                timestamp: candle.timestamp,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
                ma_10: ma_10[i],
                ma_20: ma_20[i],
                ma_50: ma_50[i],
                ma_100: ma_100[i],
                rsi_14: rsi_14[i],
                rsi_7: rsi_7[i],
                macd: macd.macd[i],
                macd_signal: macd.signal[i],
                bb_upper: bands.upper[i],
                bb_middle: bands.middle[i],
                bb_lower: bands.lower[i],
                stoch_k: stoch.k[i],
                stoch_d: stoch.d[i],
                volume_ma: volume.average[i],
                volume_ratio: volume.ratio[i],
                momentum: momentum[i],
                price_change: price_change[i],
            })
            .collect();

        tracing::trace!(token = %token, rows = candles.len(), "Computed indicator frame");

        Self { token, rows }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
