//! Baseline backends: naive, seasonal naive, drift and window average.
//!
//! These are the reference implementations of the backend contract. Each
//! trained model keeps only the tail state it needs, so an incremental
//! update is exactly equivalent to a full retrain on the concatenated data.

use super::{ForecastBackend, ForecastModel};
use crate::core::{extrapolate_timestamps, Prediction, TimeSeriesTask};
use crate::error::{EvalError, Result};
use chrono::{DateTime, Duration, Utc};

fn train_failure(backend: &str, detail: impl Into<String>) -> EvalError {
    EvalError::BackendTrain {
        backend: backend.to_string(),
        detail: detail.into(),
    }
}

// Timestamp bookkeeping shared by every baseline model.
#[derive(Debug, Clone)]
struct TailClock {
    last: DateTime<Utc>,
    spacing: Duration,
}

impl TailClock {
    fn from_task(task: &TimeSeriesTask, backend: &str) -> Result<Self> {
        let spacing = task
            .modal_spacing()
            .map_err(|e| train_failure(backend, e.to_string()))?;
        Ok(Self {
            last: task.last_timestamp(),
            spacing,
        })
    }

    /// Ensure `tail` continues strictly after the trained data, then advance.
    fn advanced(&self, tail: &TimeSeriesTask) -> Result<Self> {
        if tail.timestamps()[0] <= self.last {
            return Err(EvalError::IncrementalUpdateMismatch(format!(
                "update rows must start after {}, got {}",
                self.last,
                tail.timestamps()[0]
            )));
        }
        Ok(Self {
            last: tail.last_timestamp(),
            spacing: self.spacing,
        })
    }

    fn horizon(&self, horizon: usize) -> Vec<DateTime<Utc>> {
        extrapolate_timestamps(self.last, self.spacing, horizon)
    }
}

/// Forecasts every future step as the last observed target value.
#[derive(Debug, Clone, Default)]
pub struct NaiveBackend;

impl NaiveBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ForecastBackend for NaiveBackend {
    fn name(&self) -> &'static str {
        "Naive"
    }

    fn train(&self, task: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>> {
        let clock = TailClock::from_task(task, self.name())?;
        let last_value = *task
            .primary_target()
            .last()
            .ok_or_else(|| train_failure(self.name(), "empty series"))?;
        Ok(Box::new(NaiveModel { last_value, clock }))
    }

    fn supports_update(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct NaiveModel {
    last_value: f64,
    clock: TailClock,
}

impl ForecastModel for NaiveModel {
    fn name(&self) -> &'static str {
        "Naive"
    }

    fn predict(&self, horizon: usize) -> Result<Prediction> {
        Prediction::new(self.clock.horizon(horizon), vec![self.last_value; horizon])
    }

    fn update(&self, tail: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>> {
        let clock = self.clock.advanced(tail)?;
        let last_value = *tail
            .primary_target()
            .last()
            .ok_or_else(|| EvalError::InsufficientData { needed: 1, got: 0 })?;
        Ok(Box::new(NaiveModel { last_value, clock }))
    }
}

/// Repeats the last full seasonal cycle, using the task's declared
/// frequency as the period.
#[derive(Debug, Clone, Default)]
pub struct SeasonalNaiveBackend;

impl SeasonalNaiveBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ForecastBackend for SeasonalNaiveBackend {
    fn name(&self) -> &'static str {
        "SeasonalNaive"
    }

    fn train(&self, task: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>> {
        let period = task.frequency();
        if task.len() < period {
            return Err(train_failure(
                self.name(),
                format!("need one full cycle of {period} rows, got {}", task.len()),
            ));
        }
        let clock = TailClock::from_task(task, self.name())?;
        let target = task.primary_target();
        Ok(Box::new(SeasonalNaiveModel {
            cycle: target[target.len() - period..].to_vec(),
            period,
            clock,
        }))
    }

    fn supports_update(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct SeasonalNaiveModel {
    /// Last `period` observed target values, oldest first.
    cycle: Vec<f64>,
    period: usize,
    clock: TailClock,
}

impl ForecastModel for SeasonalNaiveModel {
    fn name(&self) -> &'static str {
        "SeasonalNaive"
    }

    fn predict(&self, horizon: usize) -> Result<Prediction> {
        let point = (0..horizon).map(|h| self.cycle[h % self.period]).collect();
        Prediction::new(self.clock.horizon(horizon), point)
    }

    fn update(&self, tail: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>> {
        let clock = self.clock.advanced(tail)?;
        let mut cycle = self.cycle.clone();
        cycle.extend_from_slice(tail.primary_target());
        cycle.drain(..cycle.len() - self.period);
        Ok(Box::new(SeasonalNaiveModel {
            cycle,
            period: self.period,
            clock,
        }))
    }
}

/// Random walk with drift: extrapolates the average historical step.
#[derive(Debug, Clone, Default)]
pub struct DriftBackend;

impl DriftBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ForecastBackend for DriftBackend {
    fn name(&self) -> &'static str {
        "Drift"
    }

    fn train(&self, task: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>> {
        if task.len() < 2 {
            return Err(train_failure(
                self.name(),
                format!("need at least 2 rows, got {}", task.len()),
            ));
        }
        let clock = TailClock::from_task(task, self.name())?;
        let target = task.primary_target();
        Ok(Box::new(DriftModel {
            first: target[0],
            last: target[target.len() - 1],
            count: target.len(),
            clock,
        }))
    }

    fn supports_update(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct DriftModel {
    first: f64,
    last: f64,
    count: usize,
    clock: TailClock,
}

impl ForecastModel for DriftModel {
    fn name(&self) -> &'static str {
        "Drift"
    }

    fn predict(&self, horizon: usize) -> Result<Prediction> {
        let slope = (self.last - self.first) / (self.count - 1) as f64;
        let point = (1..=horizon)
            .map(|h| self.last + slope * h as f64)
            .collect();
        Prediction::new(self.clock.horizon(horizon), point)
    }

    fn update(&self, tail: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>> {
        let clock = self.clock.advanced(tail)?;
        let target = tail.primary_target();
        Ok(Box::new(DriftModel {
            first: self.first,
            last: target[target.len() - 1],
            count: self.count + target.len(),
            clock,
        }))
    }
}

/// Forecasts the mean of the last `window` target values.
#[derive(Debug, Clone)]
pub struct WindowAverageBackend {
    window: usize,
}

impl WindowAverageBackend {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl ForecastBackend for WindowAverageBackend {
    fn name(&self) -> &'static str {
        "WindowAverage"
    }

    fn train(&self, task: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>> {
        if self.window == 0 {
            return Err(EvalError::Configuration(
                "window average window must be >= 1".to_string(),
            ));
        }
        if task.len() < self.window {
            return Err(train_failure(
                self.name(),
                format!("need {} rows, got {}", self.window, task.len()),
            ));
        }
        let clock = TailClock::from_task(task, self.name())?;
        let target = task.primary_target();
        Ok(Box::new(WindowAverageModel {
            values: target[target.len() - self.window..].to_vec(),
            window: self.window,
            clock,
        }))
    }

    fn supports_update(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct WindowAverageModel {
    /// Last `window` observed target values, oldest first.
    values: Vec<f64>,
    window: usize,
    clock: TailClock,
}

impl ForecastModel for WindowAverageModel {
    fn name(&self) -> &'static str {
        "WindowAverage"
    }

    fn predict(&self, horizon: usize) -> Result<Prediction> {
        let mean = self.values.iter().sum::<f64>() / self.window as f64;
        Prediction::new(self.clock.horizon(horizon), vec![mean; horizon])
    }

    fn update(&self, tail: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>> {
        let clock = self.clock.advanced(tail)?;
        let mut values = self.values.clone();
        values.extend_from_slice(tail.primary_target());
        values.drain(..values.len() - self.window);
        Ok(Box::new(WindowAverageModel {
            values,
            window: self.window,
            clock,
        }))
    }
}
