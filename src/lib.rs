//! scorecast - batch training pipeline for match-score regression
//!
//! Predicts the two score outcomes of a match from a tabular feature
//! vector. The pipeline is: deterministic train/eval partitioning,
//! leakage-free feature scaling, early-stopped round-based fitting of an
//! interchangeable regressor family (gradient-boosted trees or a
//! feed-forward network), and a seeded hyperparameter search that keeps
//! the best-scoring configuration.
//!
//! # Modules
//!
//! - [`data`] - CSV loading, numeric extraction, seeded partitioning
//! - [`preprocessing`] - standard-score scaling fitted on train only
//! - [`training`] - model families, the round-based adapter contract,
//!   and the early-stopping trainer
//! - [`optimizer`] - search space, samplers, and the trial controller
//! - [`metrics`] - R² / MAE per target and pooled
//! - [`pipeline`] - `run_training(dataset, config) -> TrainingReport`
//! - [`report`] - text rendering and JSON persistence

pub mod error;

pub mod data;
pub mod metrics;
pub mod optimizer;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod training;

pub use error::{Result, ScorecastError};

/// Re-export of the commonly used types
pub mod prelude {
    pub use crate::data::{extract_features_targets, load_csv, split_dataset, NumericTable};
    pub use crate::error::{Result, ScorecastError};
    pub use crate::metrics::{score_predictions, EvalScore, TargetScore};
    pub use crate::optimizer::{
        OptimizeDirection, SamplerKind, SearchConfig, SearchController, SearchSpace, TrialParams,
    };
    pub use crate::pipeline::{run_training, PipelineConfig, TrainingReport};
    pub use crate::preprocessing::ScalerStats;
    pub use crate::training::{fit_with_early_stopping, FittedModel, IterativeModel, ModelKind};
}
