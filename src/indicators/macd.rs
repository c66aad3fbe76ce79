use super::moving_average::ema_series;
use super::series::{defined, fill};

pub const MACD_DEFAULT: f64 = 0.0;

/// MACD line and its signal line, one value per input row
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

/// Calculate MACD (fast EMA - slow EMA) and its signal EMA
///
/// Span EMAs are defined from the first close, so short series still carry
/// a trend; only undefined rows read as zero.
pub fn calculate_macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let closes = defined(prices);
    let ema_fast = ema_series(&closes, fast);
    let ema_slow = ema_series(&closes, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal_line = ema_series(&line, signal);

    Macd {
        macd: fill(&line, MACD_DEFAULT),
        signal: fill(&signal_line, MACD_DEFAULT),
    }
}
