//! Model families and the early-stopped training loop
//!
//! Two regressor families (a gradient-boosted tree ensemble and a
//! feed-forward network) implement one round-based contract and are
//! trained by the same early-stopping driver.

pub mod config;
pub mod early_stopping;
pub mod gradient_boosting;
pub mod model;
pub mod neural_network;

pub use config::{BoostedConfig, NetworkConfig};
pub use early_stopping::{fit_with_early_stopping, StopState, StoppingRule, TrainOutcome};
pub use gradient_boosting::{BoostedSession, GradientBoostedEnsemble};
pub use model::{FittedModel, IterativeModel, ModelKind};
pub use neural_network::{Activation, FeedForwardNetwork, NetworkSession};
