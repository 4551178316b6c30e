//! Derived-feature pipelines for supervised forecasting.

mod lag;

pub use lag::{
    difference, extend, featurize, undifference, ColumnSelection, FeatureMode, FeatureTask,
    LagSpec,
};
