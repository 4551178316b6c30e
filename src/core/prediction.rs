//! Prediction: an ordered sequence of (timestamp, point forecast) pairs with
//! optional ground truth attached for scoring.

use crate::error::{EvalError, Result};
use chrono::{DateTime, Duration, Utc};

/// A point forecast over future timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    timestamps: Vec<DateTime<Utc>>,
    point: Vec<f64>,
    truth: Option<Vec<f64>>,
}

impl Prediction {
    /// Create a prediction from parallel timestamp and point vectors.
    pub fn new(timestamps: Vec<DateTime<Utc>>, point: Vec<f64>) -> Result<Self> {
        if timestamps.len() != point.len() {
            return Err(EvalError::DimensionMismatch {
                expected: timestamps.len(),
                got: point.len(),
            });
        }
        Ok(Self {
            timestamps,
            point,
            truth: None,
        })
    }

    /// Attach observed truth values, consuming the prediction.
    pub fn with_truth(mut self, truth: Vec<f64>) -> Result<Self> {
        if truth.len() != self.point.len() {
            return Err(EvalError::DimensionMismatch {
                expected: self.point.len(),
                got: truth.len(),
            });
        }
        self.truth = Some(truth);
        Ok(self)
    }

    /// Number of forecast steps.
    pub fn len(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn truth(&self) -> Option<&[f64]> {
        self.truth.as_deref()
    }

    /// Keep only the first `len` steps. `len` must not exceed the current
    /// length; the aligner enforces that with a domain error first.
    pub(crate) fn truncated(mut self, len: usize) -> Self {
        self.timestamps.truncate(len);
        self.point.truncate(len);
        if let Some(truth) = &mut self.truth {
            truth.truncate(len);
        }
        self
    }
}

/// Extrapolate `horizon` future timestamps from a last observation and a
/// fixed spacing.
pub fn extrapolate_timestamps(
    last: DateTime<Utc>,
    spacing: Duration,
    horizon: usize,
) -> Vec<DateTime<Utc>> {
    (1..=horizon as i64).map(|i| last + spacing * i as i32).collect()
}
