//! Ordinary least squares via the normal equations.
//!
//! Small dense systems only (one column per base backend), solved with a
//! Cholesky decomposition and a light ridge term on the diagonal.

use crate::error::{EvalError, Result};

/// Fitted OLS coefficients and intercept.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// One coefficient per regressor column, in input order.
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl OlsFit {
    /// Predict for a row of regressor values, one per fitted column.
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(EvalError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: row.len(),
            });
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }

    pub fn num_regressors(&self) -> usize {
        self.coefficients.len()
    }
}

/// Fit `y = intercept + X @ coefficients` where `rows[i]` is the i-th
/// observation's regressor values.
pub fn ols_fit(rows: &[Vec<f64>], y: &[f64]) -> Result<OlsFit> {
    let n = y.len();
    if n == 0 {
        return Err(EvalError::InsufficientData { needed: 1, got: 0 });
    }
    if rows.len() != n {
        return Err(EvalError::DimensionMismatch {
            expected: n,
            got: rows.len(),
        });
    }

    let k = rows[0].len();
    for row in rows {
        if row.len() != k {
            return Err(EvalError::DimensionMismatch {
                expected: k,
                got: row.len(),
            });
        }
    }
    if k == 0 {
        // No regressors: the mean is the least-squares intercept.
        return Ok(OlsFit {
            coefficients: vec![],
            intercept: y.iter().sum::<f64>() / n as f64,
        });
    }

    // Normal equations over the design [1, x1, .., xk].
    let p = k + 1;
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];

    for (row, &y_obs) in rows.iter().zip(y) {
        xtx[0][0] += 1.0;
        for j in 0..k {
            xtx[0][j + 1] += row[j];
            xtx[j + 1][0] += row[j];
        }
        for i in 0..k {
            for j in 0..k {
                xtx[i + 1][j + 1] += row[i] * row[j];
            }
        }

        xty[0] += y_obs;
        for i in 0..k {
            xty[i + 1] += row[i] * y_obs;
        }
    }

    // Ridge term for numerical stability.
    for i in 0..p {
        xtx[i][i] += 1e-8;
    }

    let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        EvalError::Computation("least squares system is not positive definite".to_string())
    })?;

    Ok(OlsFit {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
    })
}

/// Solve `A @ x = b` for symmetric positive definite `A` via Cholesky.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}
