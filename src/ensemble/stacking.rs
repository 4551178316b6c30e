//! Stacked ensembling over forecast backends.
//!
//! Training walks the rolling-origin schedule: on each split every base
//! backend is trained fresh on the training range and forecasts the test
//! range, producing one out-of-fold row per test timestamp. The meta-learner
//! is fitted on those rows, then production base models are trained on the
//! full task.

use crate::align::align;
use crate::backend::{BoxedBackend, ForecastModel};
use crate::core::{Prediction, TimeSeriesTask};
use crate::ensemble::{MetaLearner, MetaModel};
use crate::error::{EvalError, Result};
use crate::evaluate::{ErrorPolicy, SplitFailure};
use crate::resampling::{generate_splits, Split, WindowSpec};
use rayon::prelude::*;
use tracing::{info, warn};

/// Stacked ensemble training options.
#[derive(Debug, Clone)]
pub struct StackingConfig {
    /// Rolling-origin schedule used to produce out-of-fold rows.
    pub window: WindowSpec,
    /// Policy for recoverable per-split failures. A failure skips the whole
    /// split for every backend, keeping the stacked matrix rectangular.
    pub on_error: ErrorPolicy,
    /// Run splits on the rayon pool. Base backends within a split always
    /// train sequentially.
    pub parallel: bool,
}

impl StackingConfig {
    pub fn new(window: WindowSpec) -> Self {
        Self {
            window,
            on_error: ErrorPolicy::default(),
            parallel: false,
        }
    }

    pub fn with_error_policy(mut self, on_error: ErrorPolicy) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// The out-of-fold design matrix assembled during training.
///
/// Row `i` holds one forecast per base backend (in registration order) for
/// the task row `origins[i]`; every contributing model was trained strictly
/// before that row.
#[derive(Debug, Clone, PartialEq)]
pub struct OofMatrix {
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    /// Global task row index of each stacked row.
    pub origins: Vec<usize>,
}

impl OofMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A trained stacked ensemble: production base models, the fitted
/// meta-model and the data everything was trained on.
pub struct StackedEnsembleState {
    base_models: Vec<Box<dyn ForecastModel>>,
    meta_model: Box<dyn MetaModel>,
    base_names: Vec<String>,
    task: TimeSeriesTask,
    oof: OofMatrix,
    warnings: Vec<SplitFailure>,
}

impl StackedEnsembleState {
    /// Base backend names in stacked column order.
    pub fn base_names(&self) -> &[String] {
        &self.base_names
    }

    pub fn oof(&self) -> &OofMatrix {
        &self.oof
    }

    pub fn warnings(&self) -> &[SplitFailure] {
        &self.warnings
    }

    /// The task the production models were trained on.
    pub fn task(&self) -> &TimeSeriesTask {
        &self.task
    }
}

/// A stacked ensemble definition: base backends plus a meta-learner.
pub struct StackedEnsemble {
    backends: Vec<BoxedBackend>,
    meta: Box<dyn MetaLearner>,
    config: StackingConfig,
}

impl StackedEnsemble {
    pub fn new(
        backends: Vec<BoxedBackend>,
        meta: Box<dyn MetaLearner>,
        config: StackingConfig,
    ) -> Result<Self> {
        if backends.is_empty() {
            return Err(EvalError::Configuration(
                "stacked ensemble needs at least one base backend".to_string(),
            ));
        }
        Ok(Self {
            backends,
            meta,
            config,
        })
    }

    /// Train the ensemble, producing an immutable state.
    pub fn train(&self, task: &TimeSeriesTask) -> Result<StackedEnsembleState> {
        let splits = generate_splits(task.len(), &self.config.window)?;
        info!(
            splits = splits.len(),
            backends = self.backends.len(),
            meta = self.meta.name(),
            "training stacked ensemble"
        );

        let blocks: Vec<Result<SplitBlock>> = if self.config.parallel {
            splits
                .par_iter()
                .map(|split| self.stack_split(task, split))
                .collect()
        } else {
            splits
                .iter()
                .map(|split| self.stack_split(task, split))
                .collect()
        };

        let mut oof = OofMatrix {
            rows: Vec::new(),
            targets: Vec::new(),
            origins: Vec::new(),
        };
        let mut warnings = Vec::new();
        for (i, block) in blocks.into_iter().enumerate() {
            match block {
                Ok(block) => {
                    oof.rows.extend(block.rows);
                    oof.targets.extend(block.targets);
                    oof.origins.extend(block.origins);
                }
                Err(err)
                    if self.config.on_error == ErrorPolicy::WarnAndSkip
                        && err.is_recoverable() =>
                {
                    warn!(split = i, error = %err, "skipping split in stacked training");
                    warnings.push(SplitFailure {
                        split: i,
                        backend: err_backend(&err),
                        error: err,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if oof.is_empty() {
            return Err(EvalError::Computation(
                "no out-of-fold rows survived; meta-learner cannot be fitted".to_string(),
            ));
        }

        let meta_model = self.meta.fit(&oof.rows, &oof.targets)?;

        // Production models see the full task; the meta weights never do.
        let base_models = self
            .backends
            .iter()
            .map(|b| b.train(task))
            .collect::<Result<Vec<_>>>()?;

        info!(oof_rows = oof.len(), "stacked ensemble trained");

        Ok(StackedEnsembleState {
            base_models,
            meta_model,
            base_names: self.backends.iter().map(|b| b.name().to_string()).collect(),
            task: task.clone(),
            oof,
            warnings,
        })
    }

    /// Forecast `horizon` steps, optionally folding in new trailing rows
    /// first.
    ///
    /// Backends that support updates are updated in place of a retrain;
    /// the rest are retrained on the concatenated task. The meta-model is
    /// reused unchanged either way.
    pub fn predict(
        &self,
        state: &StackedEnsembleState,
        new_rows: Option<&TimeSeriesTask>,
        horizon: usize,
    ) -> Result<Prediction> {
        if horizon == 0 {
            return Err(EvalError::Configuration(
                "prediction horizon must be >= 1".to_string(),
            ));
        }

        let refreshed: Vec<Box<dyn ForecastModel>>;
        let models: Vec<&dyn ForecastModel> = match new_rows {
            None => state.base_models.iter().map(|m| m.as_ref()).collect(),
            Some(tail) => {
                let full = state.task.append(tail)?;
                refreshed = self
                    .backends
                    .iter()
                    .zip(&state.base_models)
                    .map(|(backend, model)| {
                        if backend.supports_update() {
                            model.update(tail)
                        } else {
                            backend.train(&full)
                        }
                    })
                    .collect::<Result<Vec<_>>>()?;
                refreshed.iter().map(|m| m.as_ref()).collect()
            }
        };

        let base: Vec<Prediction> = models
            .iter()
            .map(|m| {
                m.predict(horizon)
                    .and_then(|p| align(p, horizon))
                    .map_err(|e| forecast_failure(m.name(), e))
            })
            .collect::<Result<Vec<_>>>()?;

        let rows: Vec<Vec<f64>> = (0..horizon)
            .map(|h| base.iter().map(|p| p.point()[h]).collect())
            .collect();
        let point = state.meta_model.predict(&rows)?;

        Prediction::new(base[0].timestamps().to_vec(), point)
    }

    // One split's contribution to the stacked matrix.
    fn stack_split(&self, task: &TimeSeriesTask, split: &Split) -> Result<SplitBlock> {
        let train = task.slice(split.train.start, split.train.end)?;

        let mut columns = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let model = backend.train(&train)?;
            let prediction = model
                .predict(self.config.window.horizon)
                .and_then(|p| align(p, split.test_len()))
                .map_err(|e| forecast_failure(backend.name(), e))?;
            columns.push(prediction.point().to_vec());
        }

        let truth = &task.primary_target()[split.test.clone()];
        let rows = (0..split.test_len())
            .map(|t| columns.iter().map(|c| c[t]).collect())
            .collect();

        Ok(SplitBlock {
            rows,
            targets: truth.to_vec(),
            origins: split.test.clone().collect(),
        })
    }
}

struct SplitBlock {
    rows: Vec<Vec<f64>>,
    targets: Vec<f64>,
    origins: Vec<usize>,
}

// Tag forecast errors that carry no backend identity of their own, so a
// recorded split failure always names its backend.
fn forecast_failure(backend: &str, err: EvalError) -> EvalError {
    match err {
        EvalError::HorizonTooShort { .. } => EvalError::BackendPredict {
            backend: backend.to_string(),
            detail: err.to_string(),
        },
        other => other,
    }
}

fn err_backend(err: &EvalError) -> String {
    match err {
        EvalError::BackendTrain { backend, .. } | EvalError::BackendPredict { backend, .. } => {
            backend.clone()
        }
        EvalError::UpdateUnsupported(backend) => backend.clone(),
        _ => String::new(),
    }
}
