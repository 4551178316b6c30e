//! Rolling-origin resampling: turning a single ordered series into a
//! deterministic sequence of train/test splits.

use crate::error::{EvalError, Result};
use std::ops::Range;

/// Window policy for the training range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Training range always starts at the series origin; only its end
    /// advances.
    Growing,
    /// Training range has constant length `initial_size` and slides forward.
    Fixed,
}

impl Default for WindowMode {
    fn default() -> Self {
        Self::Growing
    }
}

/// Configuration for rolling-origin split generation.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    /// Initial training window size, in rows.
    pub initial_size: usize,
    /// Forecast horizon per split, in rows.
    pub horizon: usize,
    /// Step between consecutive origins, as a fraction of the horizon.
    /// Rounded to an integer step of at least 1. A cost/variance knob, not
    /// a correctness requirement.
    pub skip: f64,
    /// Window policy.
    pub mode: WindowMode,
}

impl WindowSpec {
    /// Growing (expanding) window with step 1.
    pub fn growing(initial_size: usize, horizon: usize) -> Self {
        Self {
            initial_size,
            horizon,
            skip: 0.0,
            mode: WindowMode::Growing,
        }
    }

    /// Fixed (sliding) window with step 1.
    pub fn fixed(initial_size: usize, horizon: usize) -> Self {
        Self {
            initial_size,
            horizon,
            skip: 0.0,
            mode: WindowMode::Fixed,
        }
    }

    /// Set the origin step as a fraction of the horizon.
    pub fn with_skip(mut self, skip: f64) -> Self {
        self.skip = skip;
        self
    }

    /// Resolve an absolute initial size from a fraction of the total length.
    pub fn initial_from_fraction(total_len: usize, fraction: f64) -> Result<usize> {
        if !fraction.is_finite() || fraction <= 0.0 || fraction >= 1.0 {
            return Err(EvalError::Configuration(format!(
                "initial window fraction must be in (0, 1), got {fraction}"
            )));
        }
        Ok(((total_len as f64) * fraction).floor().max(1.0) as usize)
    }

    /// Integer origin step derived from `skip`.
    pub fn step_size(&self) -> usize {
        let step = (self.skip * self.horizon as f64).round();
        (step as usize).max(1)
    }

    fn validate(&self, total_len: usize) -> Result<()> {
        if self.initial_size == 0 {
            return Err(EvalError::Configuration(
                "initial window size must be >= 1".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(EvalError::Configuration(
                "horizon must be >= 1".to_string(),
            ));
        }
        if !self.skip.is_finite() || self.skip < 0.0 {
            return Err(EvalError::Configuration(format!(
                "skip must be a finite non-negative fraction, got {}",
                self.skip
            )));
        }
        if self.initial_size + self.horizon > total_len {
            return Err(EvalError::Configuration(format!(
                "initial window ({}) plus horizon ({}) exceeds series length ({}); \
                 no split can be generated",
                self.initial_size, self.horizon, total_len
            )));
        }
        Ok(())
    }
}

/// One train/test split. Both ranges index the same task; the test range
/// starts exactly where the training range ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Range<usize>,
    pub test: Range<usize>,
}

impl Split {
    pub fn train_len(&self) -> usize {
        self.train.len()
    }

    pub fn test_len(&self) -> usize {
        self.test.len()
    }
}

/// Generate the ordered split sequence for a series of `total_len` rows.
///
/// Splits are emitted in chronological order, full-horizon first; a single
/// shorter terminal split is appended only when the last origin still lies
/// inside the series and the previous test range did not already reach the
/// series end. Later stages (stacking) rely on this total order.
pub fn generate_splits(total_len: usize, window: &WindowSpec) -> Result<Vec<Split>> {
    window.validate(total_len)?;

    let step = window.step_size();
    let mut splits = Vec::new();
    let mut train_end = window.initial_size;
    let mut covered_end = 0;

    while train_end + window.horizon <= total_len {
        let test = train_end..train_end + window.horizon;
        covered_end = test.end;
        splits.push(Split {
            train: train_range(window, train_end),
            test,
        });
        train_end += step;
    }

    // Terminal shorter split for an otherwise uncovered tail.
    if train_end < total_len && covered_end < total_len {
        splits.push(Split {
            train: train_range(window, train_end),
            test: train_end..total_len,
        });
    }

    Ok(splits)
}

fn train_range(window: &WindowSpec, train_end: usize) -> Range<usize> {
    match window.mode {
        WindowMode::Growing => 0..train_end,
        WindowMode::Fixed => train_end - window.initial_size..train_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growing_splits_share_origin_and_abut_test_ranges() {
        let window = WindowSpec::growing(10, 3);
        let splits = generate_splits(20, &window).unwrap();

        // Origins 10..=17, all full horizon.
        assert_eq!(splits.len(), 8);
        for (i, split) in splits.iter().enumerate() {
            assert_eq!(split.train.start, 0);
            assert_eq!(split.train.end, 10 + i);
            assert_eq!(split.test.start, split.train.end);
            assert_eq!(split.test_len(), 3);
        }
    }

    #[test]
    fn fixed_splits_slide_with_constant_train_length() {
        let window = WindowSpec::fixed(10, 3);
        let splits = generate_splits(20, &window).unwrap();

        assert_eq!(splits.len(), 8);
        for split in &splits {
            assert_eq!(split.train_len(), 10);
            assert_eq!(split.test.start, split.train.end);
        }
        assert_eq!(splits[0].train, 0..10);
        assert_eq!(splits[7].train, 7..17);
    }

    #[test]
    fn skip_fraction_rounds_to_integer_step() {
        assert_eq!(WindowSpec::growing(10, 10).with_skip(0.01).step_size(), 1);
        assert_eq!(WindowSpec::growing(10, 10).with_skip(0.5).step_size(), 5);
        assert_eq!(WindowSpec::growing(10, 10).with_skip(0.24).step_size(), 2);
        // Step is never zero.
        assert_eq!(WindowSpec::growing(10, 10).step_size(), 1);
    }

    #[test]
    fn step_reduces_split_count() {
        let window = WindowSpec::growing(10, 2).with_skip(1.0); // step 2
        let splits = generate_splits(20, &window).unwrap();

        // Origins 10, 12, 14, 16, 18.
        assert_eq!(splits.len(), 5);
        let origins: Vec<usize> = splits.iter().map(|s| s.test.start).collect();
        assert_eq!(origins, vec![10, 12, 14, 16, 18]);
    }

    #[test]
    fn terminal_split_covers_short_tail() {
        // Origins 100 and 115; the second test window is cut off at 120.
        let window = WindowSpec::growing(100, 10).with_skip(1.5); // step 15
        let splits = generate_splits(120, &window).unwrap();

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].test, 100..110);
        assert_eq!(splits[1].test, 115..120);
        assert_eq!(splits[1].test_len(), 5);
    }

    #[test]
    fn no_terminal_split_when_tail_already_covered() {
        // Step 1: the last full split ends exactly at the series end.
        let window = WindowSpec::growing(100, 10).with_skip(0.01);
        let splits = generate_splits(200, &window).unwrap();

        assert_eq!(splits.len(), 91);
        assert_eq!(splits.last().unwrap().test, 190..200);
        for split in &splits {
            assert_eq!(split.test_len(), 10);
        }
    }

    #[test]
    fn impossible_window_is_a_configuration_error() {
        let window = WindowSpec::growing(15, 10);
        assert!(matches!(
            generate_splits(20, &window),
            Err(EvalError::Configuration(_))
        ));

        assert!(matches!(
            generate_splits(20, &WindowSpec::growing(0, 5)),
            Err(EvalError::Configuration(_))
        ));
        assert!(matches!(
            generate_splits(20, &WindowSpec::growing(5, 0)),
            Err(EvalError::Configuration(_))
        ));
        assert!(matches!(
            generate_splits(20, &WindowSpec::growing(5, 5).with_skip(f64::NAN)),
            Err(EvalError::Configuration(_))
        ));
    }

    #[test]
    fn boundary_window_yields_single_split() {
        let window = WindowSpec::growing(15, 5);
        let splits = generate_splits(20, &window).unwrap();
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].train, 0..15);
        assert_eq!(splits[0].test, 15..20);
    }

    #[test]
    fn initial_from_fraction_resolves_row_count() {
        assert_eq!(WindowSpec::initial_from_fraction(200, 0.5).unwrap(), 100);
        assert_eq!(WindowSpec::initial_from_fraction(7, 0.5).unwrap(), 3);
        assert!(WindowSpec::initial_from_fraction(10, 0.0).is_err());
        assert!(WindowSpec::initial_from_fraction(10, 1.0).is_err());
    }
}
