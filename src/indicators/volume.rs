use super::series::{defined, fill, fill_with, finite, rolling_mean};

/// Neutral volume ratio (current volume equals its average)
pub const VOLUME_RATIO_DEFAULT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeProfile {
    pub average: Vec<f64>,
    pub ratio: Vec<f64>,
}

/// Calculate the rolling volume average and current-to-average ratio
///
/// Warmup rows take the row's close as average, like the other price-like
/// fields, and a ratio of 1. A zero average leaves the ratio at its neutral
/// default.
pub fn calculate_volume_profile(volumes: &[f64], closes: &[f64], period: usize) -> VolumeProfile {
    let average = rolling_mean(&defined(volumes), period);
    let fallback: Vec<f64> = closes.iter().map(|&c| finite(c).unwrap_or(0.0)).collect();

    let ratio: Vec<Option<f64>> = volumes
        .iter()
        .zip(&average)
        .map(|(volume, avg)| finite(volume / (*avg)?))
        .collect();

    VolumeProfile {
        average: fill_with(&average, &fallback),
        ratio: fill(&ratio, VOLUME_RATIO_DEFAULT),
    }
}
