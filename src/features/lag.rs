//! Lag/difference feature derivation.
//!
//! Turns a time-series task into a supervised-learning task by deriving
//! lagged (and differenced) columns, with incremental extension as new
//! trailing observations arrive.

use crate::core::TimeSeriesTask;
use crate::error::{EvalError, Result};
use std::collections::BTreeSet;

/// Which columns to derive features from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    /// The task's target column(s). This is the mode that turns a
    /// forecasting task into a plain supervised-learning task.
    Targets,
    /// Every column of the task.
    All,
    /// An explicit set of column labels.
    Named(Vec<String>),
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self::Targets
    }
}

/// Mode a [`FeatureTask`] was derived in, exposed so consumers can tell an
/// auto-regressive task from one built over explicit columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureMode {
    /// Lagged targets used as features.
    LaggedTargets,
    /// Features derived from an explicit column selection.
    SelectedColumns,
}

/// Specification of lag/difference derived columns.
///
/// Seasonal lags are multiples of the task's declared frequency; a seasonal
/// lag `s` at frequency `f` produces the same derived column as a plain lag
/// of `s * f`. Derived columns are named `<source>_lag<k>_diff<d>` with `k`
/// the effective row offset and `d` the difference order.
#[derive(Debug, Clone, PartialEq)]
pub struct LagSpec {
    /// Plain lags, in rows. All must be >= 1.
    pub lags: Vec<usize>,
    /// Difference order applied before lagging.
    pub differences: usize,
    /// Seasonal lags, in cycles. All must be >= 1.
    pub seasonal_lags: Vec<usize>,
    /// Source column selection.
    pub columns: ColumnSelection,
    /// If true, rows lacking history carry NaN; if false, ALL columns are
    /// truncated to the common valid range.
    pub pad_missing: bool,
}

impl LagSpec {
    /// Plain lags only, defaulting to the task targets with truncation.
    pub fn new(lags: Vec<usize>) -> Self {
        Self {
            lags,
            differences: 0,
            seasonal_lags: Vec::new(),
            columns: ColumnSelection::Targets,
            pad_missing: false,
        }
    }

    pub fn with_differences(mut self, differences: usize) -> Self {
        self.differences = differences;
        self
    }

    pub fn with_seasonal_lags(mut self, seasonal_lags: Vec<usize>) -> Self {
        self.seasonal_lags = seasonal_lags;
        self
    }

    pub fn with_columns(mut self, columns: ColumnSelection) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_pad_missing(mut self, pad_missing: bool) -> Self {
        self.pad_missing = pad_missing;
        self
    }

    /// Deduplicated effective row offsets, ascending.
    pub fn effective_offsets(&self, frequency: usize) -> Result<Vec<usize>> {
        if self.lags.iter().chain(&self.seasonal_lags).any(|&k| k == 0) {
            return Err(EvalError::Configuration(
                "lags and seasonal lags must be >= 1".to_string(),
            ));
        }
        let offsets: BTreeSet<usize> = self
            .lags
            .iter()
            .copied()
            .chain(self.seasonal_lags.iter().map(|&s| s * frequency))
            .collect();
        if offsets.is_empty() {
            return Err(EvalError::Configuration(
                "lag spec requests no lags".to_string(),
            ));
        }
        Ok(offsets.into_iter().collect())
    }

    /// Rows of history a derived row needs: the largest effective offset
    /// plus the difference order.
    pub fn max_history(&self, frequency: usize) -> Result<usize> {
        let offsets = self.effective_offsets(frequency)?;
        Ok(offsets[offsets.len() - 1] + self.differences)
    }

    fn mode(&self) -> FeatureMode {
        match self.columns {
            ColumnSelection::Targets => FeatureMode::LaggedTargets,
            _ => FeatureMode::SelectedColumns,
        }
    }
}

/// A task augmented with lag/difference columns.
///
/// Carries the spec and the originating raw task so it can be incrementally
/// extended later.
#[derive(Debug, Clone)]
pub struct FeatureTask {
    task: TimeSeriesTask,
    source: TimeSeriesTask,
    spec: LagSpec,
    mode: FeatureMode,
}

impl FeatureTask {
    /// The augmented task (original plus derived columns).
    pub fn task(&self) -> &TimeSeriesTask {
        &self.task
    }

    /// The raw task the features were derived from.
    pub fn source(&self) -> &TimeSeriesTask {
        &self.source
    }

    pub fn spec(&self) -> &LagSpec {
        &self.spec
    }

    pub fn mode(&self) -> FeatureMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.task.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task.is_empty()
    }

    /// Labels of the derived columns only.
    pub fn derived_labels(&self) -> Vec<&str> {
        self.task
            .labels()
            .iter()
            .skip(self.source.labels().len())
            .map(|l| l.as_str())
            .collect()
    }
}

/// Derive lag/difference columns from `task` per `spec`.
pub fn featurize(task: &TimeSeriesTask, spec: &LagSpec) -> Result<FeatureTask> {
    let sources = resolve_sources(task, &spec.columns)?;
    let offsets = spec.effective_offsets(task.frequency())?;
    let history = spec.max_history(task.frequency())?;

    let derived = derive_columns(task, &sources, &offsets, spec.differences)?;

    let mut labels: Vec<String> = task.labels().to_vec();
    let mut columns: Vec<Vec<f64>> = task.columns().to_vec();
    for (label, values) in derived {
        labels.push(label);
        columns.push(values);
    }

    let (timestamps, columns) = if spec.pad_missing {
        (task.timestamps().to_vec(), columns)
    } else {
        if history >= task.len() {
            return Err(EvalError::InsufficientData {
                needed: history + 1,
                got: task.len(),
            });
        }
        (
            task.timestamps()[history..].to_vec(),
            columns.into_iter().map(|c| c[history..].to_vec()).collect(),
        )
    };

    let augmented = TimeSeriesTask::new(
        timestamps,
        columns,
        labels,
        task.targets().to_vec(),
        task.frequency(),
    )?;

    Ok(FeatureTask {
        task: augmented,
        source: task.clone(),
        spec: spec.clone(),
        mode: spec.mode(),
    })
}

/// Extend a feature task with new trailing raw rows.
///
/// Only a tail window of `max_history` rows is recomputed; the result is
/// identical to re-running [`featurize`] over the concatenated raw series.
pub fn extend(feature_task: &FeatureTask, tail: &TimeSeriesTask) -> Result<FeatureTask> {
    let spec = &feature_task.spec;
    let source = &feature_task.source;
    let new_source = source.append(tail)?;

    let sources = resolve_sources(source, &spec.columns)?;
    let offsets = spec.effective_offsets(source.frequency())?;
    let history = spec.max_history(source.frequency())?;

    // Recompute derived values over the overlap window plus the new rows.
    let window_start = source.len().saturating_sub(history);
    let window = new_source.slice(window_start, new_source.len())?;
    let window_derived = derive_columns(&window, &sources, &offsets, spec.differences)?;

    // featurize() guarantees source.len() > history when pad_missing is
    // false, so every appended row lies in the valid range.
    let tail_offset = source.len() - window_start;

    let old = feature_task.task();
    let n_original = source.labels().len();

    let labels: Vec<String> = old.labels().to_vec();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(labels.len());

    for (i, label) in source.labels().iter().enumerate() {
        debug_assert_eq!(label, &labels[i]);
        let mut c = old.columns()[i].clone();
        c.extend_from_slice(&tail.columns()[i]);
        columns.push(c);
    }
    for (i, (label, values)) in window_derived.into_iter().enumerate() {
        debug_assert_eq!(label, labels[n_original + i]);
        let mut c = old.columns()[n_original + i].clone();
        c.extend_from_slice(&values[tail_offset..]);
        columns.push(c);
    }

    let mut timestamps = old.timestamps().to_vec();
    timestamps.extend_from_slice(tail.timestamps());

    let augmented = TimeSeriesTask::new(
        timestamps,
        columns,
        labels,
        old.targets().to_vec(),
        old.frequency(),
    )?;

    Ok(FeatureTask {
        task: augmented,
        source: new_source,
        spec: spec.clone(),
        mode: feature_task.mode,
    })
}

fn resolve_sources(task: &TimeSeriesTask, selection: &ColumnSelection) -> Result<Vec<String>> {
    match selection {
        ColumnSelection::Targets => Ok(task.targets().to_vec()),
        ColumnSelection::All => Ok(task.labels().to_vec()),
        ColumnSelection::Named(names) => {
            if names.is_empty() {
                return Err(EvalError::Configuration(
                    "named column selection is empty".to_string(),
                ));
            }
            for name in names {
                if task.column_index(name).is_none() {
                    return Err(EvalError::Configuration(format!(
                        "unknown column '{name}' in lag spec"
                    )));
                }
            }
            Ok(names.clone())
        }
    }
}

fn derive_columns(
    task: &TimeSeriesTask,
    sources: &[String],
    offsets: &[usize],
    differences: usize,
) -> Result<Vec<(String, Vec<f64>)>> {
    let mut derived = Vec::with_capacity(sources.len() * offsets.len());
    for source in sources {
        let diffed = difference(task.column(source)?, differences);
        for &k in offsets {
            derived.push((
                format!("{source}_lag{k}_diff{differences}"),
                shift_back(&diffed, k),
            ));
        }
    }
    Ok(derived)
}

/// Apply the d-th discrete difference: value at `t` minus value at `t - 1`,
/// `order` times. Leading entries without enough history become NaN.
pub fn difference(values: &[f64], order: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    for d in 1..=order {
        if d > out.len() {
            break;
        }
        for t in (d..out.len()).rev() {
            out[t] -= out[t - 1];
        }
        out[d - 1] = f64::NAN;
    }
    out
}

/// Invert [`difference`] given the original leading values.
///
/// Entry `t` of the result is reconstructed from `diffed[order..=t]` and
/// `original[..order]` by cumulative summation. Passes that lack the history
/// they need are skipped, matching [`difference`] on short input.
pub fn undifference(diffed: &[f64], original_leading: &[f64], order: usize) -> Vec<f64> {
    let mut out = diffed.to_vec();
    for d in (1..=order).rev() {
        if d > out.len() || d > original_leading.len() {
            continue;
        }
        out[d - 1] = original_leading_diff(original_leading, d - 1);
        for t in d..out.len() {
            out[t] += out[t - 1];
        }
    }
    out
}

// d-th difference of the original series evaluated at index d, needed to
// seed the cumulative sums.
fn original_leading_diff(original: &[f64], order: usize) -> f64 {
    difference(original, order)[order]
}

fn shift_back(values: &[f64], k: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for t in k..values.len() {
        out[t] = values[t - k];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    fn make_task(n: usize, frequency: usize) -> TimeSeriesTask {
        let values: Vec<f64> = (0..n).map(|i| (i as f64).sin() * 10.0 + i as f64).collect();
        TimeSeriesTask::univariate(make_timestamps(n), values, frequency).unwrap()
    }

    #[test]
    fn derived_columns_follow_naming_convention() {
        let task = make_task(200, 7);
        let spec = LagSpec::new(vec![2, 3, 4])
            .with_differences(1)
            .with_seasonal_lags(vec![1, 2]);
        let ft = featurize(&task, &spec).unwrap();

        assert_eq!(
            ft.derived_labels(),
            vec![
                "y_lag2_diff1",
                "y_lag3_diff1",
                "y_lag4_diff1",
                "y_lag7_diff1",
                "y_lag14_diff1",
            ]
        );
        // Common valid range: max effective lag 14 plus one difference.
        assert_eq!(ft.len(), 200 - 15);
    }

    #[test]
    fn plain_lags_drop_max_lag_plus_difference_rows() {
        let task = make_task(200, 7);
        let spec = LagSpec::new(vec![2, 3, 4]).with_differences(1);
        let ft = featurize(&task, &spec).unwrap();

        assert_eq!(ft.derived_labels().len(), 3);
        assert_eq!(ft.len(), 200 - 5);
        assert_eq!(ft.task().timestamps()[0], task.timestamps()[5]);
    }

    #[test]
    fn lag_values_are_shifted_source_values() {
        let values: Vec<f64> = (0..20).map(|i| i as f64 * 2.0).collect();
        let task = TimeSeriesTask::univariate(make_timestamps(20), values, 1).unwrap();
        let spec = LagSpec::new(vec![3]);
        let ft = featurize(&task, &spec).unwrap();

        let lagged = ft.task().column("y_lag3_diff0").unwrap();
        let original = ft.task().column("y").unwrap();
        for t in 0..lagged.len() {
            // Row t of the truncated frame is row t + 3 of the source.
            assert_relative_eq!(lagged[t], original[t] - 6.0);
            assert_relative_eq!(lagged[t], (t as f64) * 2.0);
        }
    }

    #[test]
    fn pad_missing_keeps_length_with_nan_sentinels() {
        let task = make_task(20, 1);
        let spec = LagSpec::new(vec![2])
            .with_differences(1)
            .with_pad_missing(true);
        let ft = featurize(&task, &spec).unwrap();

        assert_eq!(ft.len(), 20);
        let derived = ft.task().column("y_lag2_diff1").unwrap();
        assert!(derived[0].is_nan());
        assert!(derived[1].is_nan());
        assert!(derived[2].is_nan());
        assert!(!derived[3].is_nan());
    }

    #[test]
    fn default_selection_lags_targets_and_reports_mode() {
        let task = make_task(30, 1);
        let ft = featurize(&task, &LagSpec::new(vec![1])).unwrap();
        assert_eq!(ft.mode(), FeatureMode::LaggedTargets);

        let ft = featurize(
            &task,
            &LagSpec::new(vec![1]).with_columns(ColumnSelection::All),
        )
        .unwrap();
        assert_eq!(ft.mode(), FeatureMode::SelectedColumns);
    }

    #[test]
    fn named_selection_is_validated() {
        let task = make_task(30, 1);
        let spec =
            LagSpec::new(vec![1]).with_columns(ColumnSelection::Named(vec!["nope".to_string()]));
        assert!(matches!(
            featurize(&task, &spec),
            Err(EvalError::Configuration(_))
        ));

        let spec = LagSpec::new(vec![1]).with_columns(ColumnSelection::Named(vec![]));
        assert!(matches!(
            featurize(&task, &spec),
            Err(EvalError::Configuration(_))
        ));
    }

    #[test]
    fn degenerate_specs_are_rejected() {
        let task = make_task(30, 1);
        assert!(matches!(
            featurize(&task, &LagSpec::new(vec![])),
            Err(EvalError::Configuration(_))
        ));
        assert!(matches!(
            featurize(&task, &LagSpec::new(vec![0])),
            Err(EvalError::Configuration(_))
        ));
        // Not enough rows left after truncation.
        assert!(matches!(
            featurize(&task, &LagSpec::new(vec![40])),
            Err(EvalError::InsufficientData { .. })
        ));
    }

    #[test]
    fn difference_round_trip_reconstructs_original() {
        let values: Vec<f64> = (0..50)
            .map(|i| (i as f64 * 0.37).sin() * 12.0 + 0.4 * i as f64)
            .collect();

        for order in 1..=3 {
            let diffed = difference(&values, order);
            let restored = undifference(&diffed, &values, order);
            for (v, r) in values.iter().zip(restored.iter()).skip(order) {
                assert_relative_eq!(v, r, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn differencing_tolerates_short_input() {
        assert!(difference(&[], 2).is_empty());
        assert!(undifference(&[], &[], 2).is_empty());

        // No seed history available: the value passes through untouched.
        assert_eq!(undifference(&[5.0], &[], 1), vec![5.0]);

        // A single seed value is enough for a first-order pass.
        let original = [3.0, 7.0];
        let diffed = difference(&original, 1);
        assert_eq!(undifference(&diffed, &original[..1], 1), vec![3.0, 7.0]);

        // Order exceeding the series length degrades instead of panicking.
        let one = difference(&[4.0], 3);
        assert!(one[0].is_nan());
        assert_eq!(undifference(&[4.0], &[4.0], 3), vec![4.0]);
    }

    #[test]
    fn extend_matches_full_recomputation() {
        let task = make_task(60, 7);
        let spec = LagSpec::new(vec![2, 5])
            .with_differences(2)
            .with_seasonal_lags(vec![1]);

        for k in [30usize, 45, 59] {
            let head = task.slice(0, k).unwrap();
            let tail = task.slice(k, 60).unwrap();

            let incremental = extend(&featurize(&head, &spec).unwrap(), &tail).unwrap();
            let full = featurize(&task, &spec).unwrap();

            assert_eq!(incremental.task().labels(), full.task().labels());
            assert_eq!(incremental.len(), full.len());
            for label in full.task().labels() {
                let a = incremental.task().column(label).unwrap();
                let b = full.task().column(label).unwrap();
                for (x, y) in a.iter().zip(b.iter()) {
                    assert!(
                        (x.is_nan() && y.is_nan()) || x == y,
                        "column {label} diverged: {x} vs {y}"
                    );
                }
            }
        }
    }

    #[test]
    fn extend_rejects_non_contiguous_rows() {
        let task = make_task(60, 7);
        let head = task.slice(0, 30).unwrap();
        let ft = featurize(&head, &LagSpec::new(vec![2])).unwrap();

        let overlapping = task.slice(29, 35).unwrap();
        assert!(matches!(
            extend(&ft, &overlapping),
            Err(EvalError::IncrementalUpdateMismatch(_))
        ));
    }

    #[test]
    fn extend_keeps_nan_padding_mode() {
        let task = make_task(40, 1);
        let spec = LagSpec::new(vec![3]).with_pad_missing(true);
        let head = task.slice(0, 25).unwrap();
        let tail = task.slice(25, 40).unwrap();

        let incremental = extend(&featurize(&head, &spec).unwrap(), &tail).unwrap();
        let full = featurize(&task, &spec).unwrap();

        assert_eq!(incremental.len(), 40);
        let a = incremental.task().column("y_lag3_diff0").unwrap();
        let b = full.task().column("y_lag3_diff0").unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x.is_nan() && y.is_nan()) || x == y);
        }
    }
}
