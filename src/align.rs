//! Horizon alignment between raw model output and a test window.
//!
//! A backend may emit more steps than a split can score (for instance when a
//! shorter terminal split follows full-horizon training). Alignment truncates
//! surplus steps and never pads; a prediction shorter than the test window is
//! a hard error.

use crate::core::Prediction;
use crate::error::{EvalError, Result};

/// Align `prediction` to a test window of `test_len` rows.
pub fn align(prediction: Prediction, test_len: usize) -> Result<Prediction> {
    if prediction.len() < test_len {
        return Err(EvalError::HorizonTooShort {
            have: prediction.len(),
            need: test_len,
        });
    }
    Ok(prediction.truncated(test_len))
}
