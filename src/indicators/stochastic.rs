use super::series::{defined, fill, finite, rolling_max, rolling_mean, rolling_min};
use crate::models::Candle;

/// Neutral %K / %D used whenever the value is undefined
pub const STOCHASTIC_DEFAULT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// Calculate the Stochastic oscillator
///
/// `%K = 100 * (close - lowest low) / (highest high - lowest low)` over
/// `period` candles, `%D` is the mean of the last `smoothing` %K values.
/// A flat range leaves %K undefined. Values are clamped to [0, 100] so a
/// candle whose close sits outside its own high/low cannot escape the scale.
pub fn calculate_stochastic(candles: &[Candle], period: usize, smoothing: usize) -> Stochastic {
    if candles.len() < period {
        return Stochastic {
            k: vec![STOCHASTIC_DEFAULT; candles.len()],
            d: vec![STOCHASTIC_DEFAULT; candles.len()],
        };
    }

    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();

    let highest = rolling_max(&defined(&highs), period);
    let lowest = rolling_min(&defined(&lows), period);

    let k: Vec<Option<f64>> = candles
        .iter()
        .zip(highest.iter().zip(&lowest))
        .map(|(candle, (hh, ll))| {
            let (hh, ll) = ((*hh)?, (*ll)?);
            finite(100.0 * (candle.close - ll) / (hh - ll)).map(|v| v.clamp(0.0, 100.0))
        })
        .collect();

    let d = rolling_mean(&k, smoothing);

    Stochastic {
        k: fill(&k, STOCHASTIC_DEFAULT),
        d: fill(&d, STOCHASTIC_DEFAULT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_candles(bars: &[(f64, f64, f64)]) -> Vec<Candle> {
        bars.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Candle {
                token: "TEST".to_string(),
                timestamp: Utc::now() + chrono::Duration::hours(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_close_at_top_of_range() {
        let bars: Vec<(f64, f64, f64)> = (0..16)
            .map(|i| {
                let base = 100.0 + i as f64;
                (base + 1.0, base - 1.0, base + 1.0)
            })
            .collect();
        let stoch = calculate_stochastic(&create_test_candles(&bars), 14, 3);

        assert_eq!(stoch.k[15], 100.0);
        assert_eq!(stoch.d[15], 100.0);
    }

    #[test]
    fn test_flat_range_is_neutral() {
        let bars = vec![(100.0, 100.0, 100.0); 20];
        let stoch = calculate_stochastic(&create_test_candles(&bars), 14, 3);
        assert!(stoch.k.iter().all(|&v| v == STOCHASTIC_DEFAULT));
        assert!(stoch.d.iter().all(|&v| v == STOCHASTIC_DEFAULT));
    }

    #[test]
    fn test_insufficient_data() {
        let bars = vec![(101.0, 99.0, 100.0); 5];
        let stoch = calculate_stochastic(&create_test_candles(&bars), 14, 3);
        assert_eq!(stoch.k, vec![STOCHASTIC_DEFAULT; 5]);
    }

    #[test]
    fn test_d_needs_full_smoothing_window() {
        let bars: Vec<(f64, f64, f64)> = (0..15)
            .map(|i| (110.0, 90.0, 90.0 + i as f64))
            .collect();
        let stoch = calculate_stochastic(&create_test_candles(&bars), 14, 3);

        // %K first defined at row 13, %D at row 15
        assert_eq!(stoch.d[13], STOCHASTIC_DEFAULT);
        assert_eq!(stoch.d[14], STOCHASTIC_DEFAULT);
        assert_eq!(stoch.k[14], 70.0);
    }

    #[test]
    fn test_close_outside_range_is_clamped() {
        let mut bars = vec![(101.0, 99.0, 100.0); 14];
        bars.push((101.0, 99.0, 120.0));
        let stoch = calculate_stochastic(&create_test_candles(&bars), 14, 3);
        assert_eq!(stoch.k[14], 100.0);
    }
}
