//! Meta-learner traits and the linear (OLS) meta-learner.
//!
//! A meta-learner combines base-backend forecasts into one final forecast.
//! It is fitted on out-of-fold rows only, so it never sees a base forecast
//! made over that forecast's own training data.

use crate::error::Result;
use crate::utils::{ols_fit, OlsFit};

/// A trainable combiner over base forecast rows.
///
/// `rows[i]` holds one forecast per base backend, in registration order.
pub trait MetaLearner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fit on stacked rows and observed targets of equal length.
    fn fit(&self, rows: &[Vec<f64>], targets: &[f64]) -> Result<Box<dyn MetaModel>>;
}

/// A fitted combiner.
pub trait MetaModel: Send + Sync {
    /// Combine one row of base forecasts per future step.
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Linear regression meta-learner: intercept plus one weight per base
/// backend, fitted by least squares.
#[derive(Debug, Clone, Default)]
pub struct LinearMetaLearner;

impl LinearMetaLearner {
    pub fn new() -> Self {
        Self
    }
}

impl MetaLearner for LinearMetaLearner {
    fn name(&self) -> &'static str {
        "Linear"
    }

    fn fit(&self, rows: &[Vec<f64>], targets: &[f64]) -> Result<Box<dyn MetaModel>> {
        let fit = ols_fit(rows, targets)?;
        Ok(Box::new(LinearMetaModel { fit }))
    }
}

#[derive(Debug, Clone)]
struct LinearMetaModel {
    fit: OlsFit,
}

impl MetaModel for LinearMetaModel {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.fit.predict_row(row)).collect()
    }
}
