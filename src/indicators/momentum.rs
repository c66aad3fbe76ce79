use super::series::{diff, fill, pct_change};

/// Price difference over `lag` candles, 0 during warmup
pub fn momentum_series(prices: &[f64], lag: usize) -> Vec<f64> {
    fill(&diff(prices, lag), 0.0)
}

/// Fractional price change over `lag` candles (0.05 = +5%), 0 during warmup
pub fn price_change_series(prices: &[f64], lag: usize) -> Vec<f64> {
    fill(&pct_change(prices, lag), 0.0)
}
