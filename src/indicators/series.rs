//! Rolling-window helpers shared by the indicators
//!
//! Undefined values are carried as `None` until an indicator fills them with
//! its documented default. NaN and infinities are never let through: they are
//! mapped to `None` at every step.

/// Map a raw value to `None` when it is NaN or infinite
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Lift a raw series into the undefined-aware representation
pub fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|&v| finite(v)).collect()
}

/// Fill undefined entries with a constant default
pub fn fill(values: &[Option<f64>], default: f64) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(default)).collect()
}

/// Fill undefined entries with a per-row default (e.g. the row's close)
pub fn fill_with(values: &[Option<f64>], defaults: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(defaults)
        .map(|(v, &default)| v.unwrap_or(default))
        .collect()
}

/// Apply `reducer` over each trailing window of `period` values
///
/// A row is undefined until `period` values are available, or when any value
/// in its window is undefined.
pub fn rolling<F>(values: &[Option<f64>], period: usize, reducer: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = Vec::with_capacity(values.len());
    let mut window = Vec::with_capacity(period);

    for i in 0..values.len() {
        if period == 0 || i + 1 < period {
            out.push(None);
            continue;
        }

        window.clear();
        window.extend(values[i + 1 - period..=i].iter().map_while(|v| *v));

        if window.len() == period {
            out.push(finite(reducer(&window)));
        } else {
            out.push(None);
        }
    }

    out
}

pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Rolling sample standard deviation (n - 1 denominator)
pub fn rolling_std(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; values.len()];
    }

    rolling(values, period, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let variance = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        variance.sqrt()
    })
}

pub fn rolling_min(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// `x[t] - x[t - lag]`
pub fn diff(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if lag == 0 || i < lag {
                None
            } else {
                finite(values[i] - values[i - lag])
            }
        })
        .collect()
}

/// `x[t] / x[t - lag] - 1`, undefined when the base is zero
pub fn pct_change(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if lag == 0 || i < lag {
                None
            } else {
                finite(values[i] / values[i - lag] - 1.0)
            }
        })
        .collect()
}

/// Mean of the defined entries, `None` if there are none
pub fn mean_defined(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0_f64, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        finite(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rolling_mean_warmup() {
        let values = defined(&[1.0, 2.0, 3.0, 4.0]);
        let mean = rolling_mean(&values, 3);
        assert_eq!(mean, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_rolling_window_with_gap_is_undefined() {
        let values = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let mean = rolling_mean(&values, 2);
        assert_eq!(mean, vec![None, None, None, Some(3.5), Some(4.5)]);
    }

    #[test]
    fn test_rolling_std_is_sample_std() {
        let values = defined(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let std = rolling_std(&values, 8);
        // Sample variance = 32 / 7
        assert_relative_eq!(std[7].unwrap(), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_min_max() {
        let values = defined(&[5.0, 1.0, 4.0, 3.0]);
        assert_eq!(rolling_min(&values, 2), vec![None, Some(1.0), Some(1.0), Some(3.0)]);
        assert_eq!(rolling_max(&values, 2), vec![None, Some(5.0), Some(4.0), Some(4.0)]);
    }

    #[test]
    fn test_pct_change_zero_base_is_undefined() {
        let change = pct_change(&[0.0, 1.0, 2.0], 1);
        assert_eq!(change, vec![None, None, Some(1.0)]);
    }

    #[test]
    fn test_defined_drops_nan_and_infinity() {
        let values = defined(&[1.0, f64::NAN, f64::INFINITY]);
        assert_eq!(values, vec![Some(1.0), None, None]);
        assert_eq!(fill(&values, 7.0), vec![1.0, 7.0, 7.0]);
    }

    #[test]
    fn test_mean_defined() {
        assert_eq!(mean_defined(&[None, Some(2.0), Some(4.0)]), Some(3.0));
        assert_eq!(mean_defined(&[None, None]), None);
    }
}
