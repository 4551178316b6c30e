//! # rollcast
//!
//! Rolling-origin evaluation, lag/difference features and stacked
//! ensembling for time-series forecasts.
//!
//! The crate is organised around a few small pieces:
//!
//! - [`core::TimeSeriesTask`]: an immutable, uniquely-timestamped series
//!   with designated target columns and a declared seasonal frequency.
//! - [`features`]: lag/difference featurization with incremental extension.
//! - [`resampling`]: rolling-origin train/test schedules over a task.
//! - [`backend`]: the `ForecastBackend`/`ForecastModel` traits plus the
//!   baseline reference backends.
//! - [`evaluate`]: scoring a backend over a schedule with a configurable
//!   error policy.
//! - [`ensemble`]: stacked ensembling with a leakage-free out-of-fold
//!   design matrix and a linear meta-learner.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use rollcast::core::TimeSeriesTask;
//! use rollcast::backend::DriftBackend;
//! use rollcast::evaluate::{evaluate, EvalContext};
//! use rollcast::measures::mae;
//! use rollcast::resampling::WindowSpec;
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let timestamps = (0..60).map(|i| base + Duration::days(i)).collect();
//! let values = (0..60).map(|i| i as f64).collect();
//! let task = TimeSeriesTask::univariate(timestamps, values, 7).unwrap();
//!
//! let window = WindowSpec::growing(40, 5);
//! let eval = evaluate(&DriftBackend::new(), &task, &window, &mae, &EvalContext::default())
//!     .unwrap();
//! assert!(eval.aggregate().unwrap() < 1e-9);
//! ```

pub mod align;
pub mod backend;
pub mod core;
pub mod ensemble;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod measures;
pub mod resampling;
pub mod utils;

pub use error::{EvalError, Result};
