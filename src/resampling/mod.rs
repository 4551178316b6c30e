//! Rolling-origin resampling schedules.

mod rolling_origin;

pub use rolling_origin::{generate_splits, Split, WindowMode, WindowSpec};
