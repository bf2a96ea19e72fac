//! Per-family hyperparameter configurations
//!
//! Configurations are built from sampled trial parameters; every value is
//! range-checked here so an out-of-bounds configuration surfaces as
//! `InvalidHyperparameter` before any training starts.

use crate::error::{Result, ScorecastError};
use crate::optimizer::search_space::{ParameterValue, TrialParams};
use serde::{Deserialize, Serialize};

/// Hyperparameters for the gradient-boosted ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedConfig {
    /// Round budget: one tree per target is grown per round
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// Minimum loss reduction to make a split
    pub gamma: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub seed: u64,
}

impl Default for BoostedConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            seed: 42,
        }
    }
}

impl BoostedConfig {
    /// Build a configuration from sampled trial parameters.
    /// Unsampled fields keep their defaults.
    pub fn from_params(params: &TrialParams, seed: u64) -> Result<Self> {
        let mut cfg = Self {
            seed,
            ..Default::default()
        };
        if let Some(v) = params.get("n_estimators") {
            cfg.n_estimators = int_value("n_estimators", v)? as usize;
        }
        if let Some(v) = params.get("learning_rate") {
            cfg.learning_rate = float_value("learning_rate", v)?;
        }
        if let Some(v) = params.get("max_depth") {
            cfg.max_depth = int_value("max_depth", v)? as usize;
        }
        if let Some(v) = params.get("min_child_weight") {
            cfg.min_child_weight = float_value("min_child_weight", v)?;
        }
        if let Some(v) = params.get("reg_lambda") {
            cfg.reg_lambda = float_value("reg_lambda", v)?;
        }
        if let Some(v) = params.get("reg_alpha") {
            cfg.reg_alpha = float_value("reg_alpha", v)?;
        }
        if let Some(v) = params.get("gamma") {
            cfg.gamma = float_value("gamma", v)?;
        }
        if let Some(v) = params.get("subsample") {
            cfg.subsample = float_value("subsample", v)?;
        }
        if let Some(v) = params.get("colsample_bytree") {
            cfg.colsample_bytree = float_value("colsample_bytree", v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        check("n_estimators", self.n_estimators as f64, |v| v >= 1.0, "must be at least 1")?;
        check("learning_rate", self.learning_rate, |v| v > 0.0 && v <= 1.0, "must lie in (0, 1]")?;
        check("max_depth", self.max_depth as f64, |v| v >= 1.0, "must be at least 1")?;
        check("min_child_weight", self.min_child_weight, |v| v >= 0.0, "must be non-negative")?;
        check("reg_lambda", self.reg_lambda, |v| v >= 0.0, "must be non-negative")?;
        check("reg_alpha", self.reg_alpha, |v| v >= 0.0, "must be non-negative")?;
        check("gamma", self.gamma, |v| v >= 0.0, "must be non-negative")?;
        check("subsample", self.subsample, |v| v > 0.0 && v <= 1.0, "must lie in (0, 1]")?;
        check("colsample_bytree", self.colsample_bytree, |v| v > 0.0 && v <= 1.0, "must lie in (0, 1]")?;
        Ok(())
    }
}

/// Hyperparameters for the feed-forward network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub hidden_layers: Vec<usize>,
    /// Hidden-layer activation name ("relu", "tanh", "sigmoid")
    pub activation: String,
    pub learning_rate: f64,
    /// Round budget: one epoch per round
    pub max_epochs: usize,
    pub batch_size: usize,
    /// L2 weight decay
    pub weight_decay: f64,
    pub momentum: f64,
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![64],
            activation: "relu".to_string(),
            learning_rate: 0.01,
            max_epochs: 200,
            batch_size: 32,
            weight_decay: 1e-4,
            momentum: 0.9,
            seed: 42,
        }
    }
}

impl NetworkConfig {
    /// Build a configuration from sampled trial parameters.
    ///
    /// The layer stack is sampled as `hidden_size` repeated `n_layers`
    /// times rather than as a free-form list.
    pub fn from_params(params: &TrialParams, seed: u64) -> Result<Self> {
        let mut cfg = Self {
            seed,
            ..Default::default()
        };
        let mut hidden_size = 64usize;
        let mut n_layers = 1usize;
        if let Some(v) = params.get("hidden_size") {
            hidden_size = int_value("hidden_size", v)? as usize;
        }
        if let Some(v) = params.get("n_layers") {
            n_layers = int_value("n_layers", v)? as usize;
        }
        cfg.hidden_layers = vec![hidden_size; n_layers.max(1)];
        if let Some(v) = params.get("learning_rate") {
            cfg.learning_rate = float_value("learning_rate", v)?;
        }
        if let Some(v) = params.get("batch_size") {
            cfg.batch_size = int_value("batch_size", v)? as usize;
        }
        if let Some(v) = params.get("weight_decay") {
            cfg.weight_decay = float_value("weight_decay", v)?;
        }
        if let Some(v) = params.get("momentum") {
            cfg.momentum = float_value("momentum", v)?;
        }
        if let Some(v) = params.get("activation") {
            cfg.activation = str_value("activation", v)?.to_string();
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.hidden_layers.is_empty() || self.hidden_layers.iter().any(|&h| h == 0) {
            return Err(invalid(
                "hidden_layers",
                format!("{:?}", self.hidden_layers),
                "every hidden layer needs at least one unit",
            ));
        }
        if !matches!(self.activation.as_str(), "relu" | "tanh" | "sigmoid") {
            return Err(invalid(
                "activation",
                self.activation.clone(),
                "must be one of relu, tanh, sigmoid",
            ));
        }
        check("learning_rate", self.learning_rate, |v| v > 0.0, "must be positive")?;
        check("max_epochs", self.max_epochs as f64, |v| v >= 1.0, "must be at least 1")?;
        check("batch_size", self.batch_size as f64, |v| v >= 1.0, "must be at least 1")?;
        check("weight_decay", self.weight_decay, |v| v >= 0.0, "must be non-negative")?;
        check("momentum", self.momentum, |v| (0.0..1.0).contains(&v), "must lie in [0, 1)")?;
        Ok(())
    }
}

fn invalid(name: &str, value: String, reason: &str) -> ScorecastError {
    ScorecastError::InvalidHyperparameter {
        name: name.to_string(),
        value,
        reason: reason.to_string(),
    }
}

fn check(name: &str, value: f64, ok: impl Fn(f64) -> bool, reason: &str) -> Result<()> {
    if ok(value) {
        Ok(())
    } else {
        Err(invalid(name, value.to_string(), reason))
    }
}

fn float_value(name: &str, value: &ParameterValue) -> Result<f64> {
    value
        .as_float()
        .ok_or_else(|| invalid(name, format!("{:?}", value), "expected a numeric value"))
}

fn int_value(name: &str, value: &ParameterValue) -> Result<i64> {
    let v = value
        .as_int()
        .ok_or_else(|| invalid(name, format!("{:?}", value), "expected an integer value"))?;
    if v < 0 {
        return Err(invalid(name, v.to_string(), "must be non-negative"));
    }
    Ok(v)
}

fn str_value<'a>(name: &str, value: &'a ParameterValue) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| invalid(name, format!("{:?}", value), "expected a categorical value"))
}
