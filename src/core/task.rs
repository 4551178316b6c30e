//! TimeSeriesTask: an ordered, uniquely-timestamped series with a declared
//! seasonal frequency and designated target columns.

use crate::error::{EvalError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// An immutable time-indexed task.
///
/// Values are stored column-major: `columns[dimension][observation]`. The
/// task is read-only once constructed; [`TimeSeriesTask::append`] produces a
/// new task rather than mutating in place, so index ranges computed against
/// an earlier version remain valid.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTask {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<Vec<f64>>,
    labels: Vec<String>,
    targets: Vec<String>,
    frequency: usize,
}

/// Builder for constructing a [`TimeSeriesTask`].
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesTaskBuilder {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<Vec<f64>>,
    labels: Vec<String>,
    targets: Vec<String>,
    frequency: usize,
}

impl TimeSeriesTaskBuilder {
    pub fn new() -> Self {
        Self {
            frequency: 1,
            ..Self::default()
        }
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Add a named value column.
    pub fn column(mut self, label: impl Into<String>, values: Vec<f64>) -> Self {
        self.labels.push(label.into());
        self.columns.push(values);
        self
    }

    /// Declare which columns are forecast targets.
    pub fn targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    /// Declare the seasonal frequency (observations per cycle).
    pub fn frequency(mut self, frequency: usize) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn build(self) -> Result<TimeSeriesTask> {
        TimeSeriesTask::new(
            self.timestamps,
            self.columns,
            self.labels,
            self.targets,
            self.frequency,
        )
    }
}

impl TimeSeriesTask {
    /// Create a new task with full validation.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        columns: Vec<Vec<f64>>,
        labels: Vec<String>,
        targets: Vec<String>,
        frequency: usize,
    ) -> Result<Self> {
        if timestamps.is_empty() {
            return Err(EvalError::InsufficientData { needed: 1, got: 0 });
        }
        if frequency < 1 {
            return Err(EvalError::Configuration(
                "frequency must be >= 1".to_string(),
            ));
        }
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(EvalError::Configuration(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if columns.is_empty() {
            return Err(EvalError::Configuration(
                "task must have at least one column".to_string(),
            ));
        }
        if labels.len() != columns.len() {
            return Err(EvalError::DimensionMismatch {
                expected: columns.len(),
                got: labels.len(),
            });
        }
        for series in &columns {
            if series.len() != timestamps.len() {
                return Err(EvalError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: series.len(),
                });
            }
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for label in &labels {
            if seen.insert(label.as_str(), 1).is_some() {
                return Err(EvalError::Configuration(format!(
                    "duplicate column label '{label}'"
                )));
            }
        }

        if targets.is_empty() {
            return Err(EvalError::Configuration(
                "task must declare at least one target column".to_string(),
            ));
        }
        for target in &targets {
            if !labels.iter().any(|l| l == target) {
                return Err(EvalError::Configuration(format!(
                    "target '{target}' is not a column of the task"
                )));
            }
        }

        Ok(Self {
            timestamps,
            columns,
            labels,
            targets,
            frequency,
        })
    }

    /// Create a univariate task where the single column is the target.
    pub fn univariate(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
        frequency: usize,
    ) -> Result<Self> {
        Self::new(
            timestamps,
            vec![values],
            vec!["y".to_string()],
            vec!["y".to_string()],
            frequency,
        )
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// A task always has at least one row; kept for iterator-style callers.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Declared observations per seasonal cycle.
    pub fn frequency(&self) -> usize {
        self.frequency
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        *self.timestamps.last().expect("task is never empty")
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Labels that are not targets.
    pub fn feature_labels(&self) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|l| !self.targets.contains(l))
            .map(|l| l.as_str())
            .collect()
    }

    /// All value columns, column-major.
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Values of a named column.
    pub fn column(&self, label: &str) -> Result<&[f64]> {
        self.column_index(label)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| EvalError::Configuration(format!("unknown column '{label}'")))
    }

    /// Values of the first declared target.
    pub fn primary_target(&self) -> &[f64] {
        let idx = self
            .column_index(&self.targets[0])
            .expect("targets are validated against labels");
        &self.columns[idx]
    }

    /// Extract a half-open row range as a new task with the same schema.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeriesTask> {
        if start >= end {
            return Err(EvalError::Configuration(
                "slice start must be < end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(EvalError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }

        Ok(TimeSeriesTask {
            timestamps: self.timestamps[start..end].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| c[start..end].to_vec())
                .collect(),
            labels: self.labels.clone(),
            targets: self.targets.clone(),
            frequency: self.frequency,
        })
    }

    /// Append trailing rows, producing a new task.
    ///
    /// The tail must share the schema (labels, targets, frequency) and its
    /// first timestamp must come strictly after this task's last one.
    pub fn append(&self, tail: &TimeSeriesTask) -> Result<TimeSeriesTask> {
        if tail.labels != self.labels
            || tail.targets != self.targets
            || tail.frequency != self.frequency
        {
            return Err(EvalError::IncrementalUpdateMismatch(
                "appended rows must share the task schema".to_string(),
            ));
        }
        if tail.timestamps[0] <= self.last_timestamp() {
            return Err(EvalError::IncrementalUpdateMismatch(format!(
                "appended rows must start after {}, got {}",
                self.last_timestamp(),
                tail.timestamps[0]
            )));
        }

        let mut timestamps = self.timestamps.clone();
        timestamps.extend_from_slice(&tail.timestamps);
        let columns = self
            .columns
            .iter()
            .zip(tail.columns.iter())
            .map(|(head, tail)| {
                let mut c = head.clone();
                c.extend_from_slice(tail);
                c
            })
            .collect();

        Ok(TimeSeriesTask {
            timestamps,
            columns,
            labels: self.labels.clone(),
            targets: self.targets.clone(),
            frequency: self.frequency,
        })
    }

    /// The most common spacing between consecutive timestamps.
    ///
    /// Used to extrapolate future timestamps; the series need not be
    /// calendar-continuous, so the modal spacing is a heuristic, not an
    /// invariant.
    pub fn modal_spacing(&self) -> Result<Duration> {
        if self.len() < 2 {
            return Err(EvalError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }
        let modal = counts
            .into_iter()
            .max_by_key(|&(secs, count)| (count, std::cmp::Reverse(secs)))
            .map(|(secs, _)| secs)
            .expect("at least one spacing exists");

        Ok(Duration::seconds(modal))
    }
}
