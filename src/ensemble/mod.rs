//! Stacked ensembling: base backends combined by a meta-learner trained on
//! out-of-fold forecasts.

mod meta;
mod stacking;

pub use meta::{LinearMetaLearner, MetaLearner, MetaModel};
pub use stacking::{OofMatrix, StackedEnsemble, StackedEnsembleState, StackingConfig};
