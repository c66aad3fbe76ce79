use super::series::{fill, finite, rolling_mean};

/// Neutral RSI used whenever the value is undefined
pub const RSI_DEFAULT: f64 = 50.0;

/// Calculate Relative Strength Index (RSI) for every row
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Average gain and loss are plain rolling means over `period` changes (not
/// Wilder smoothing). A zero average loss is replaced by 1 in the ratio, so
/// a flat-loss window does not divide by zero. Warmup rows and series shorter
/// than `period` read as 50.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
pub fn rsi_series(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return vec![RSI_DEFAULT; prices.len()];
    }

    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());

    // First row has no prior close
    gains.push(Some(0.0));
    losses.push(Some(0.0));

    for window in prices.windows(2) {
        let change = finite(window[1] - window[0]).unwrap_or(0.0);
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    let rsi: Vec<Option<f64>> = avg_gains
        .iter()
        .zip(&avg_losses)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) => {
                let denominator = if *loss == 0.0 { 1.0 } else { *loss };
                let rs = gain / denominator;
                finite(100.0 - (100.0 / (1.0 + rs))).map(|v| v.clamp(0.0, 100.0))
            }
            _ => None,
        })
        .collect();

    fill(&rsi, RSI_DEFAULT)
}

/// Latest RSI value, 50 when there is no data
pub fn latest_rsi(prices: &[f64], period: usize) -> f64 {
    rsi_series(prices, period)
        .last()
        .copied()
        .unwrap_or(RSI_DEFAULT)
}
