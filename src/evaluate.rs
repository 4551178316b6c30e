//! Rolling-origin evaluation of a single backend.
//!
//! Drives the full resample/train/predict/align/score loop and applies the
//! configured error policy per split.

use crate::align::align;
use crate::backend::ForecastBackend;
use crate::core::TimeSeriesTask;
use crate::error::{EvalError, Result};
use crate::measures::Measure;
use crate::resampling::{generate_splits, Split, WindowSpec};
use rayon::prelude::*;
use tracing::{debug, warn};

/// What to do when a split fails with a recoverable error.
///
/// Configuration errors are never policy-suppressed; they abort the run
/// under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the whole evaluation on the first failure.
    FailFast,
    /// Log the failure, record it, and skip the split.
    WarnAndSkip,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::FailFast
    }
}

/// Evaluation run options.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalContext {
    pub on_error: ErrorPolicy,
    /// Score splits on the rayon pool instead of sequentially. Results are
    /// joined by split index, so the output is identical either way.
    pub parallel: bool,
}

/// A split that was skipped under [`ErrorPolicy::WarnAndSkip`].
#[derive(Debug, Clone, PartialEq)]
pub struct SplitFailure {
    pub split: usize,
    pub backend: String,
    pub error: EvalError,
}

/// Per-split scores plus any skipped-split records.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// One entry per generated split, in chronological order; `None` marks
    /// a skipped split.
    pub split_scores: Vec<Option<f64>>,
    pub warnings: Vec<SplitFailure>,
}

impl Evaluation {
    /// Mean score over the splits that produced one. `None` when every
    /// split was skipped.
    pub fn aggregate(&self) -> Option<f64> {
        let scored: Vec<f64> = self.split_scores.iter().flatten().copied().collect();
        if scored.is_empty() {
            return None;
        }
        Some(scored.iter().sum::<f64>() / scored.len() as f64)
    }

    /// Number of splits that produced a score.
    pub fn scored_splits(&self) -> usize {
        self.split_scores.iter().flatten().count()
    }
}

/// Evaluate `backend` over the rolling-origin schedule of `window`.
pub fn evaluate(
    backend: &dyn ForecastBackend,
    task: &TimeSeriesTask,
    window: &WindowSpec,
    measure: &Measure,
    ctx: &EvalContext,
) -> Result<Evaluation> {
    let splits = generate_splits(task.len(), window)?;
    debug!(
        backend = backend.name(),
        splits = splits.len(),
        horizon = window.horizon,
        "scoring rolling-origin schedule"
    );

    let outcomes: Vec<Result<f64>> = if ctx.parallel {
        splits
            .par_iter()
            .map(|split| score_split(backend, task, split, window.horizon, measure))
            .collect()
    } else {
        splits
            .iter()
            .map(|split| score_split(backend, task, split, window.horizon, measure))
            .collect()
    };

    let mut split_scores = Vec::with_capacity(outcomes.len());
    let mut warnings = Vec::new();
    for (i, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(score) => split_scores.push(Some(score)),
            Err(err) if ctx.on_error == ErrorPolicy::WarnAndSkip && err.is_recoverable() => {
                warn!(split = i, backend = backend.name(), error = %err, "skipping split");
                warnings.push(SplitFailure {
                    split: i,
                    backend: backend.name().to_string(),
                    error: err,
                });
                split_scores.push(None);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(Evaluation {
        split_scores,
        warnings,
    })
}

fn score_split(
    backend: &dyn ForecastBackend,
    task: &TimeSeriesTask,
    split: &Split,
    horizon: usize,
    measure: &Measure,
) -> Result<f64> {
    let train = task.slice(split.train.start, split.train.end)?;
    let model = backend.train(&train)?;
    let prediction = align(model.predict(horizon)?, split.test_len())?;
    let truth = &task.primary_target()[split.test.clone()];
    Ok(measure(truth, prediction.point()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DriftBackend, ForecastModel, NaiveBackend, SeasonalNaiveBackend};
    use crate::measures::mae;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    fn linear_task(n: usize) -> TimeSeriesTask {
        let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
        TimeSeriesTask::univariate(make_timestamps(n), values, 1).unwrap()
    }

    #[test]
    fn drift_scores_perfectly_on_linear_data() {
        let task = linear_task(60);
        let window = WindowSpec::growing(40, 5);
        let eval = evaluate(
            &DriftBackend::new(),
            &task,
            &window,
            &mae,
            &EvalContext::default(),
        )
        .unwrap();

        assert_eq!(eval.split_scores.len(), 16);
        assert!(eval.warnings.is_empty());
        assert_relative_eq!(eval.aggregate().unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn naive_error_grows_with_horizon_on_a_trend() {
        let task = linear_task(60);
        let short = evaluate(
            &NaiveBackend::new(),
            &task,
            &WindowSpec::growing(40, 2),
            &mae,
            &EvalContext::default(),
        )
        .unwrap();
        let long = evaluate(
            &NaiveBackend::new(),
            &task,
            &WindowSpec::growing(40, 10),
            &mae,
            &EvalContext::default(),
        )
        .unwrap();

        assert!(long.aggregate().unwrap() > short.aggregate().unwrap());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let values: Vec<f64> = (0..80).map(|i| (i as f64 * 0.3).sin() * 7.0).collect();
        let task = TimeSeriesTask::univariate(make_timestamps(80), values, 1).unwrap();
        let window = WindowSpec::growing(50, 6).with_skip(0.5);

        let seq = evaluate(
            &DriftBackend::new(),
            &task,
            &window,
            &mae,
            &EvalContext {
                parallel: false,
                ..Default::default()
            },
        )
        .unwrap();
        let par = evaluate(
            &DriftBackend::new(),
            &task,
            &window,
            &mae,
            &EvalContext {
                parallel: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(seq, par);
    }

    #[test]
    fn warn_and_skip_records_recoverable_failures() {
        // Seasonal naive needs a full cycle of 30 rows; early growing
        // windows are too short to train.
        let task = TimeSeriesTask::univariate(
            make_timestamps(50),
            (0..50).map(|i| i as f64).collect(),
            30,
        )
        .unwrap();
        let window = WindowSpec::growing(20, 5);

        let failed = evaluate(
            &SeasonalNaiveBackend::new(),
            &task,
            &window,
            &mae,
            &EvalContext::default(),
        );
        assert!(matches!(failed, Err(EvalError::BackendTrain { .. })));

        let eval = evaluate(
            &SeasonalNaiveBackend::new(),
            &task,
            &window,
            &mae,
            &EvalContext {
                on_error: ErrorPolicy::WarnAndSkip,
                ..Default::default()
            },
        )
        .unwrap();

        // Splits with train_end < 30 are skipped, the rest are scored.
        assert!(!eval.warnings.is_empty());
        assert_eq!(eval.warnings[0].split, 0);
        assert!(eval.split_scores[0].is_none());
        assert!(eval.scored_splits() > 0);
        assert!(eval.aggregate().is_some());
    }

    #[test]
    fn configuration_errors_ignore_the_policy() {
        let task = linear_task(10);
        let window = WindowSpec::growing(20, 5);
        let result = evaluate(
            &NaiveBackend::new(),
            &task,
            &window,
            &mae,
            &EvalContext {
                on_error: ErrorPolicy::WarnAndSkip,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(EvalError::Configuration(_))));
    }

    // Backend whose predictions are one step too short, to exercise the
    // alignment failure path.
    struct ShortBackend;
    struct ShortModel {
        inner: Box<dyn ForecastModel>,
    }

    impl ForecastBackend for ShortBackend {
        fn name(&self) -> &'static str {
            "Short"
        }

        fn train(&self, task: &TimeSeriesTask) -> crate::error::Result<Box<dyn ForecastModel>> {
            Ok(Box::new(ShortModel {
                inner: NaiveBackend::new().train(task)?,
            }))
        }
    }

    impl ForecastModel for ShortModel {
        fn name(&self) -> &'static str {
            "Short"
        }

        fn predict(&self, horizon: usize) -> crate::error::Result<crate::core::Prediction> {
            self.inner.predict(horizon.saturating_sub(1))
        }
    }

    #[test]
    fn short_predictions_are_skippable_but_not_silently_padded() {
        let task = linear_task(30);
        let window = WindowSpec::growing(20, 5);

        assert!(matches!(
            evaluate(&ShortBackend, &task, &window, &mae, &EvalContext::default()),
            Err(EvalError::HorizonTooShort { have: 4, need: 5 })
        ));

        let eval = evaluate(
            &ShortBackend,
            &task,
            &window,
            &mae,
            &EvalContext {
                on_error: ErrorPolicy::WarnAndSkip,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(eval.scored_splits(), 0);
        assert_eq!(eval.aggregate(), None);
    }
}
