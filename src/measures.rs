//! Accuracy measures for scoring aligned predictions.
//!
//! Every measure takes `(actual, predicted)` slices of equal length and
//! returns a scalar score where lower is better.

/// Object-safe measure signature used by the evaluator.
pub type Measure = dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync;

/// Mean absolute error.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    sum / actual.len() as f64
}

/// Root mean squared error.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    (sum / actual.len() as f64).sqrt()
}

/// Symmetric mean absolute percentage error, in percent (0..=200).
///
/// Terms where both values are zero contribute zero rather than 0/0.
pub fn smape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                (a - p).abs() / denom
            }
        })
        .sum();
    200.0 * sum / actual.len() as f64
}
