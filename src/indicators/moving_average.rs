use super::series::{defined, fill_with, rolling_mean};

/// Simple Moving Average series over closing prices
///
/// Rows without `period` closes of history take the row's own close, which
/// keeps crossover comparisons neutral during warmup.
pub fn sma_series(prices: &[f64], period: usize) -> Vec<f64> {
    let sma = rolling_mean(&defined(prices), period);
    fill_with(&sma, prices)
}

/// Exponential Moving Average with span semantics
///
/// `alpha = 2 / (span + 1)`. Weights are bias-adjusted from the first sample
/// (`sum(w_i * x_i) / sum(w_i)` with `w_i = (1 - alpha)^i`), so the series is
/// defined from the first defined input instead of after a seed window.
/// Undefined inputs contribute nothing but still decay earlier weights.
pub fn ema_series(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    values
        .iter()
        .map(|value| {
            weighted_sum *= decay;
            weight_total *= decay;

            if let Some(v) = value {
                weighted_sum += v;
                weight_total += 1.0;
            }

            if weight_total > 0.0 {
                Some(weighted_sum / weight_total)
            } else {
                None
            }
        })
        .collect()
}
