//! Feed-forward network regressor with a two-unit linear output head
//!
//! Mini-batch SGD with momentum and L2 weight decay; one epoch per
//! training round.

use crate::error::{Result, ScorecastError};
use crate::metrics::pooled_rmse;
use crate::training::config::NetworkConfig;
use crate::training::model::{FittedModel, IterativeModel};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Hidden-layer activation function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    ReLU,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "relu" => Ok(Self::ReLU),
            "sigmoid" => Ok(Self::Sigmoid),
            "tanh" => Ok(Self::Tanh),
            other => Err(ScorecastError::InvalidHyperparameter {
                name: "activation".to_string(),
                value: other.to_string(),
                reason: "must be one of relu, tanh, sigmoid".to_string(),
            }),
        }
    }

    fn apply(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::ReLU => z.mapv(|v| v.max(0.0)),
            Self::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
            Self::Tanh => z.mapv(f64::tanh),
        }
    }

    fn derivative(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Self::Sigmoid => {
                let sig = self.apply(z);
                &sig * &(1.0 - &sig)
            }
            Self::Tanh => {
                let t = z.mapv(f64::tanh);
                1.0 - &t * &t
            }
        }
    }
}

/// A fitted feed-forward network; hidden layers use the configured
/// activation, the output layer is linear with one unit per target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedForwardNetwork {
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    activation: Activation,
    n_features: usize,
    n_outputs: usize,
}

impl FeedForwardNetwork {
    /// Initialize with Xavier/Glorot weights from the config's seed.
    pub fn new(config: &NetworkConfig, n_features: usize, n_outputs: usize) -> Result<Self> {
        let activation = Activation::parse(&config.activation)?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);

        let mut layer_sizes = vec![n_features];
        layer_sizes.extend(&config.hidden_layers);
        layer_sizes.push(n_outputs);

        let mut weights = Vec::new();
        let mut biases = Vec::new();
        for pair in layer_sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();
            let w = Array2::from_shape_fn((n_in, n_out), |_| rng.gen::<f64>() * 2.0 * scale - scale);
            weights.push(w);
            biases.push(Array1::zeros(n_out));
        }

        Ok(Self {
            weights,
            biases,
            activation,
            n_features,
            n_outputs,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features {
            return Err(ScorecastError::DimensionMismatch {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }
        let (activations, _) = self.forward(x);
        Ok(activations
            .into_iter()
            .next_back()
            .unwrap_or_else(|| x.clone()))
    }

    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let mut activations = vec![x.clone()];
        let mut z_values = Vec::new();

        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = activations[activations.len() - 1].dot(w) + b;
            z_values.push(z.clone());

            let a = if i < self.weights.len() - 1 {
                self.activation.apply(&z)
            } else {
                z // linear output for regression
            };
            activations.push(a);
        }

        (activations, z_values)
    }

    fn backward(
        &self,
        y: &Array2<f64>,
        activations: &[Array2<f64>],
        z_values: &[Array2<f64>],
    ) -> Vec<(Array2<f64>, Array1<f64>)> {
        let n = y.nrows() as f64;
        let mut gradients = Vec::new();

        // MSE gradient at the linear output
        let output = &activations[activations.len() - 1];
        let mut delta = (output - y) / n;

        for i in (0..self.weights.len()).rev() {
            let a_prev = &activations[i];
            let grad_w = a_prev.t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));
            gradients.push((grad_w, grad_b));

            if i > 0 {
                let z = &z_values[i - 1];
                delta = delta.dot(&self.weights[i].t()) * self.activation.derivative(z);
            }
        }

        gradients.reverse();
        gradients
    }
}

/// An in-progress network training run over a fixed train/eval split.
pub struct NetworkSession {
    config: NetworkConfig,
    net: FeedForwardNetwork,
    velocities_w: Vec<Array2<f64>>,
    velocities_b: Vec<Array1<f64>>,
    train_x: Array2<f64>,
    train_y: Array2<f64>,
    eval_x: Array2<f64>,
    eval_y: Array2<f64>,
    rng: Xoshiro256PlusPlus,
}

impl NetworkSession {
    pub fn new(
        config: NetworkConfig,
        train_x: Array2<f64>,
        train_y: Array2<f64>,
        eval_x: Array2<f64>,
        eval_y: Array2<f64>,
    ) -> Result<Self> {
        if train_x.nrows() != train_y.nrows() || eval_x.nrows() != eval_y.nrows() {
            return Err(ScorecastError::DimensionMismatch {
                expected: "matching feature/target row counts".to_string(),
                actual: format!(
                    "train {} vs {}, eval {} vs {}",
                    train_x.nrows(),
                    train_y.nrows(),
                    eval_x.nrows(),
                    eval_y.nrows()
                ),
            });
        }

        let net = FeedForwardNetwork::new(&config, train_x.ncols(), train_y.ncols())?;
        let velocities_w = net
            .weights
            .iter()
            .map(|w| Array2::zeros(w.raw_dim()))
            .collect();
        let velocities_b = net
            .biases
            .iter()
            .map(|b| Array1::zeros(b.len()))
            .collect();
        // epoch shuffling gets its own stream so weight init stays fixed
        let rng = Xoshiro256PlusPlus::seed_from_u64(config.seed.wrapping_add(1));

        Ok(Self {
            config,
            net,
            velocities_w,
            velocities_b,
            train_x,
            train_y,
            eval_x,
            eval_y,
            rng,
        })
    }

    fn gather_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
        let n_cols = x.ncols();
        let mut rows = Vec::with_capacity(indices.len() * n_cols);
        for &i in indices {
            rows.extend(x.row(i).iter().copied());
        }
        Array2::from_shape_vec((indices.len(), n_cols), rows)
            .unwrap_or_else(|_| Array2::zeros((0, n_cols)))
    }
}

impl IterativeModel for NetworkSession {
    fn step(&mut self) -> Result<f64> {
        let n = self.train_x.nrows();
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng);

        for batch_start in (0..n).step_by(self.config.batch_size) {
            let batch_end = (batch_start + self.config.batch_size).min(n);
            let batch = &indices[batch_start..batch_end];

            let x_batch = Self::gather_rows(&self.train_x, batch);
            let y_batch = Self::gather_rows(&self.train_y, batch);

            let (activations, z_values) = self.net.forward(&x_batch);
            let gradients = self.net.backward(&y_batch, &activations, &z_values);

            for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                self.velocities_w[i] = &self.velocities_w[i] * self.config.momentum
                    - &grad_w * self.config.learning_rate;
                self.velocities_b[i] = &self.velocities_b[i] * self.config.momentum
                    - &grad_b * self.config.learning_rate;

                self.net.weights[i] = &self.net.weights[i] + &self.velocities_w[i];
                self.net.biases[i] = &self.net.biases[i] + &self.velocities_b[i];

                let decay = 1.0 - self.config.weight_decay * self.config.learning_rate;
                self.net.weights[i] = &self.net.weights[i] * decay;
            }
        }

        let eval_pred = self.net.predict(&self.eval_x)?;
        Ok(pooled_rmse(&self.eval_y, &eval_pred))
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.net.predict(x)
    }

    fn snapshot(&self) -> FittedModel {
        FittedModel::Network(self.net.clone())
    }

    fn round_budget(&self) -> usize {
        self.config.max_epochs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Array2<f64>, Array2<f64>) {
        let x = Array2::from_shape_fn((n, 3), |(r, c)| ((r * 7 + c * 3) % 11) as f64 / 11.0 - 0.5);
        let y = Array2::from_shape_fn((n, 2), |(r, t)| {
            let row = x.row(r);
            if t == 0 {
                row[0] + 0.5 * row[1]
            } else {
                row[2] - row[1]
            }
        });
        (x, y)
    }

    fn session(lr: f64) -> NetworkSession {
        let (x, y) = linear_data(120);
        let train_x = x.slice(ndarray::s![..90, ..]).to_owned();
        let train_y = y.slice(ndarray::s![..90, ..]).to_owned();
        let eval_x = x.slice(ndarray::s![90.., ..]).to_owned();
        let eval_y = y.slice(ndarray::s![90.., ..]).to_owned();
        let config = NetworkConfig {
            hidden_layers: vec![16],
            learning_rate: lr,
            ..Default::default()
        };
        NetworkSession::new(config, train_x, train_y, eval_x, eval_y).unwrap()
    }

    #[test]
    fn test_epochs_reduce_eval_loss() {
        let mut session = session(0.05);
        let first = session.step().unwrap();
        let mut last = first;
        for _ in 0..60 {
            last = session.step().unwrap();
        }
        assert!(
            last < first,
            "eval loss should drop: first {} last {}",
            first,
            last
        );
    }

    #[test]
    fn test_predict_shape() {
        let session = session(0.01);
        let (x, _) = linear_data(5);
        let preds = session.predict(&x).unwrap();
        assert_eq!(preds.dim(), (5, 2));
    }

    #[test]
    fn test_snapshot_is_standalone() {
        let mut session = session(0.05);
        for _ in 0..10 {
            session.step().unwrap();
        }
        let snapshot = session.snapshot();
        // training past the snapshot must not change it
        let (x, _) = linear_data(5);
        let before = snapshot.predict(&x).unwrap();
        for _ in 0..5 {
            session.step().unwrap();
        }
        let after = snapshot.predict(&x).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_huge_learning_rate_diverges() {
        let mut session = session(1e6);
        let mut saw_non_finite = false;
        for _ in 0..20 {
            let loss = session.step().unwrap();
            if !loss.is_finite() {
                saw_non_finite = true;
                break;
            }
        }
        assert!(saw_non_finite, "expected the loss to blow up");
    }

    #[test]
    fn test_wrong_width_rejected() {
        let session = session(0.01);
        let bad = Array2::zeros((3, 9));
        assert!(matches!(
            session.predict(&bad),
            Err(ScorecastError::DimensionMismatch { .. })
        ));
    }
}
