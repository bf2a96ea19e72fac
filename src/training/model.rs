//! The model-adapter seam: round-based fitting behind one trait
//!
//! Any regressor that can advance one round at a time and report the
//! eval-partition loss plugs into the early-stopping trainer and the
//! search controller without either knowing which family it is.

use crate::data::DatasetSplit;
use crate::error::{Result, ScorecastError};
use crate::optimizer::search_space::{SearchSpace, TrialParams};
use crate::training::config::{BoostedConfig, NetworkConfig};
use crate::training::gradient_boosting::{BoostedSession, GradientBoostedEnsemble};
use crate::training::neural_network::{FeedForwardNetwork, NetworkSession};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Round-based fitting over a fixed train/eval split.
///
/// One `step` call performs a single unit of incremental training (a
/// boosting round or an epoch) and returns the eval loss after it.
/// `snapshot` materializes the current round's state as a standalone
/// model, which is how "predictions from round R" are served even when R
/// is not the final round.
pub trait IterativeModel {
    fn step(&mut self) -> Result<f64>;

    /// Predict with the current round's state.
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Copy the current round's state into a standalone fitted model.
    fn snapshot(&self) -> FittedModel;

    /// The model's own round budget (n_estimators or max_epochs).
    fn round_budget(&self) -> usize;
}

/// A trained model at a specific configuration, detached from its
/// training run. Carries everything `predict` needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FittedModel {
    Boosted(GradientBoostedEnsemble),
    Network(FeedForwardNetwork),
}

impl FittedModel {
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            FittedModel::Boosted(m) => m.predict(x),
            FittedModel::Network(m) => m.predict(x),
        }
    }

    /// Feature importances, where the family supports them.
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        match self {
            FittedModel::Boosted(m) => Some(m.feature_importances()),
            FittedModel::Network(_) => None,
        }
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&json)?;
        Ok(model)
    }
}

/// The model families the pipeline can search over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    GradientBoosting,
    NeuralNetwork,
}

impl ModelKind {
    /// Start a training session from sampled hyperparameters.
    ///
    /// The session owns its copies of the partition data, so concurrent
    /// trials never share mutable training state.
    pub fn start_session(
        &self,
        params: &TrialParams,
        split: &DatasetSplit,
        seed: u64,
    ) -> Result<Box<dyn IterativeModel>> {
        let train_x = split.train.features.values.clone();
        let train_y = split.train.targets.clone();
        let eval_x = split.eval.features.values.clone();
        let eval_y = split.eval.targets.clone();

        match self {
            ModelKind::GradientBoosting => {
                let config = BoostedConfig::from_params(params, seed)?;
                Ok(Box::new(BoostedSession::new(
                    config, train_x, train_y, eval_x, eval_y,
                )?))
            }
            ModelKind::NeuralNetwork => {
                let config = NetworkConfig::from_params(params, seed)?;
                Ok(Box::new(NetworkSession::new(
                    config, train_x, train_y, eval_x, eval_y,
                )?))
            }
        }
    }

    /// The default search space for this family.
    pub fn default_search_space(&self) -> SearchSpace {
        match self {
            ModelKind::GradientBoosting => SearchSpace::new()
                .log_float("learning_rate", 1e-5, 1e-1)
                .int("max_depth", 2, 10)
                .int("n_estimators", 100, 1000)
                .float("subsample", 0.5, 1.0)
                .float("colsample_bytree", 0.5, 1.0)
                .int("min_child_weight", 1, 10),
            ModelKind::NeuralNetwork => SearchSpace::new()
                .log_float("learning_rate", 1e-4, 1e-1)
                .int("hidden_size", 16, 128)
                .int("n_layers", 1, 3)
                .float("momentum", 0.5, 0.95)
                .log_float("weight_decay", 1e-6, 1e-2)
                .categorical("activation", vec!["relu", "tanh"]),
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = ScorecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "boosted" | "gradient-boosting" => Ok(ModelKind::GradientBoosting),
            "network" | "neural-network" => Ok(ModelKind::NeuralNetwork),
            other => Err(ScorecastError::InvalidHyperparameter {
                name: "model".to_string(),
                value: other.to_string(),
                reason: "must be one of boosted, network".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{split_dataset, NumericTable};
    use std::collections::HashMap;

    fn split() -> DatasetSplit {
        let features = NumericTable {
            names: vec!["a".to_string(), "b".to_string()],
            values: Array2::from_shape_fn((40, 2), |(r, c)| (r + c) as f64 * 0.1),
        };
        let targets = NumericTable {
            names: vec!["home".to_string(), "away".to_string()],
            values: Array2::from_shape_fn((40, 2), |(r, t)| (r * (t + 1)) as f64 * 0.1),
        };
        split_dataset(&features, &targets, 0.25, 42).unwrap()
    }

    #[test]
    fn test_both_families_run_under_one_contract() {
        let split = split();
        let params: TrialParams = HashMap::new();
        for kind in [ModelKind::GradientBoosting, ModelKind::NeuralNetwork] {
            let mut session = kind.start_session(&params, &split, 3).unwrap();
            let loss = session.step().unwrap();
            assert!(loss.is_finite(), "{:?} produced a non-finite loss", kind);
            assert!(session.round_budget() >= 1);

            let preds = session
                .predict(&split.eval.features.values)
                .unwrap();
            assert_eq!(preds.dim(), (split.eval.n_rows(), 2));
        }
    }

    #[test]
    fn test_fitted_model_round_trip() {
        let split = split();
        let params: TrialParams = HashMap::new();
        let mut session = ModelKind::GradientBoosting
            .start_session(&params, &split, 1)
            .unwrap();
        session.step().unwrap();
        let model = session.snapshot();

        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        model.save(path).unwrap();
        let loaded = FittedModel::load(path).unwrap();

        let x = &split.eval.features.values;
        assert_eq!(model.predict(x).unwrap(), loaded.predict(x).unwrap());
    }

    #[test]
    fn test_model_kind_from_str() {
        assert_eq!(
            "boosted".parse::<ModelKind>().unwrap(),
            ModelKind::GradientBoosting
        );
        assert_eq!(
            "network".parse::<ModelKind>().unwrap(),
            ModelKind::NeuralNetwork
        );
        assert!("tree".parse::<ModelKind>().is_err());
    }
}
