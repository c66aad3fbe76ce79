use super::series::{defined, fill_with, rolling_mean, rolling_std};

/// Bollinger Bands aligned with the input rows
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Calculate Bollinger Bands: SMA(period) +/- width * sample std
///
/// Rows without a full window collapse all three bands onto the close.
pub fn calculate_bollinger(prices: &[f64], period: usize, width: f64) -> BollingerBands {
    let closes = defined(prices);
    let middle = rolling_mean(&closes, period);
    let std = rolling_std(&closes, period);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&std)
            .map(|(m, s)| Some((*m)? + sign * width * (*s)?))
            .collect()
    };

    BollingerBands {
        upper: fill_with(&band(1.0), prices),
        middle: fill_with(&middle, prices),
        lower: fill_with(&band(-1.0), prices),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bands_collapse_during_warmup() {
        let prices: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let bands = calculate_bollinger(&prices, 20, 2.0);
        assert_eq!(bands.upper, prices);
        assert_eq!(bands.middle, prices);
        assert_eq!(bands.lower, prices);
    }

    #[test]
    fn test_bands_are_symmetric() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i % 4) as f64).collect();
        let bands = calculate_bollinger(&prices, 20, 2.0);

        for i in 19..30 {
            assert!(bands.upper[i] >= bands.middle[i]);
            assert!(bands.lower[i] <= bands.middle[i]);
            assert_relative_eq!(
                bands.upper[i] - bands.middle[i],
                bands.middle[i] - bands.lower[i],
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_flat_prices_have_zero_width() {
        let prices = vec![42.0; 25];
        let bands = calculate_bollinger(&prices, 20, 2.0);
        assert_relative_eq!(bands.upper[24], 42.0, epsilon = 1e-12);
        assert_relative_eq!(bands.lower[24], 42.0, epsilon = 1e-12);
    }
}
