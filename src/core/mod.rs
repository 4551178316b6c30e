//! Core data structures: time-indexed tasks and forecast results.

mod prediction;
mod task;

pub use prediction::{extrapolate_timestamps, Prediction};
pub use task::{TimeSeriesTask, TimeSeriesTaskBuilder};
