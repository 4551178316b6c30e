//! Forecast backend traits and the backend registry.
//!
//! A [`ForecastBackend`] is a stateless model family; training it on a task
//! produces an immutable [`ForecastModel`]. Updating a model with new
//! trailing rows also produces a new model, so a model trained on one split
//! can never observe data from a later one.

pub mod baseline;

use crate::core::{Prediction, TimeSeriesTask};
use crate::error::{EvalError, Result};

pub use baseline::{DriftBackend, NaiveBackend, SeasonalNaiveBackend, WindowAverageBackend};

/// A model family that can be trained on a task.
///
/// This trait is object-safe and can be used with `Box<dyn ForecastBackend>`.
pub trait ForecastBackend: Send + Sync {
    /// Display name, used in error reports and stacked column ordering.
    fn name(&self) -> &'static str;

    /// Train a fresh model on the full task.
    fn train(&self, task: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>>;

    /// Whether models of this family accept incremental updates.
    fn supports_update(&self) -> bool {
        false
    }
}

/// A trained, immutable model.
pub trait ForecastModel: Send {
    fn name(&self) -> &'static str;

    /// Forecast `horizon` steps past the end of the training data.
    fn predict(&self, horizon: usize) -> Result<Prediction>;

    /// Fold in trailing rows, producing a new model. The rows must start
    /// strictly after the data this model was trained on.
    fn update(&self, tail: &TimeSeriesTask) -> Result<Box<dyn ForecastModel>> {
        let _ = tail;
        Err(EvalError::UpdateUnsupported(self.name().to_string()))
    }
}

/// Type alias for boxed backend trait objects.
pub type BoxedBackend = Box<dyn ForecastBackend>;

/// Backend specification for batch evaluation: a named factory producing
/// fresh backend instances.
pub struct BackendSpec {
    /// Display name of the backend.
    pub name: &'static str,
    factory: Box<dyn Fn() -> BoxedBackend + Send + Sync>,
}

impl BackendSpec {
    pub fn new<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn() -> BoxedBackend + Send + Sync + 'static,
    {
        Self {
            name,
            factory: Box::new(factory),
        }
    }

    /// Create a new backend instance.
    pub fn create(&self) -> BoxedBackend {
        (self.factory)()
    }
}

/// Collection of backend specifications for batch evaluation.
pub struct BackendRegistry {
    backends: Vec<BackendSpec>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    pub fn register(&mut self, spec: BackendSpec) {
        self.backends.push(spec);
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendSpec> {
        self.backends.iter()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
