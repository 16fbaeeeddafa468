//! Small numeric helpers shared by the metrics, trend and gap modules.
//!
//! Every helper returns a neutral value (usually `0.0`) instead of dividing by
//! zero, so callers never see `NaN` from an empty slice.

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance; `0.0` for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// `numerator / denominator`, or `0.0` when the denominator is zero or the
/// result would not be finite.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let q = numerator / denominator;
    if q.is_finite() {
        q
    } else {
        0.0
    }
}

/// Clamp a percentage into 0–100.
pub fn clamp_pct(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Result of an ordinary least-squares fit of `y` against `0..n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to 0–1.
    pub r_squared: f64,
}

/// Fit `y = slope * x + intercept` where `x` is the sequential index of each
/// value.
///
/// A flat series has nothing to explain, so its `r_squared` is `0.0`.
pub fn linear_regression(ys: &[f64]) -> LinearFit {
    let n = ys.len() as f64;
    if ys.len() < 2 {
        return LinearFit {
            slope: 0.0,
            intercept: ys.first().copied().unwrap_or(0.0),
            r_squared: 0.0,
        };
    }

    let sum_x: f64 = (0..ys.len()).map(|i| i as f64).sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = ys.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_xx: f64 = (0..ys.len()).map(|i| (i as f64).powi(2)).sum();

    let slope = safe_div(n * sum_xy - sum_x * sum_y, n * sum_xx - sum_x.powi(2));
    let intercept = (sum_y - slope * sum_x) / n;

    let y_mean = sum_y / n;
    let ss_tot: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = ys
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
        .sum();

    let r_squared = if ss_tot == 0.0 {
        0.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    LinearFit {
        slope,
        intercept,
        r_squared,
    }
}
