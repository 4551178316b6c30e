//! Numerical utilities.

pub mod ols;

pub use ols::{ols_fit, OlsFit};
