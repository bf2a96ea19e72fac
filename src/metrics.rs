//! Goodness-of-fit scoring for the evaluation partition

use crate::error::{Result, ScorecastError};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// R² and mean absolute error for one target column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetScore {
    pub target: String,
    pub r2: f64,
    pub mae: f64,
}

/// Scores per target plus values pooled over both targets.
///
/// Pooled values are the uniform average across target columns, matching
/// how a joint 2-vector prediction is conventionally scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalScore {
    pub per_target: Vec<TargetScore>,
    pub pooled_r2: f64,
    pub pooled_mae: f64,
}

/// Score predictions against true targets, per column and pooled.
pub fn score_predictions(
    target_names: &[String],
    y_true: &Array2<f64>,
    y_pred: &Array2<f64>,
) -> Result<EvalScore> {
    if y_true.dim() != y_pred.dim() {
        return Err(ScorecastError::DimensionMismatch {
            expected: format!("{:?}", y_true.dim()),
            actual: format!("{:?}", y_pred.dim()),
        });
    }
    if y_true.nrows() == 0 {
        return Err(ScorecastError::EmptyDataset(
            "cannot score an empty prediction set".to_string(),
        ));
    }

    let per_target: Vec<TargetScore> = y_true
        .axis_iter(Axis(1))
        .zip(y_pred.axis_iter(Axis(1)))
        .enumerate()
        .map(|(c, (t, p))| TargetScore {
            target: target_names
                .get(c)
                .cloned()
                .unwrap_or_else(|| format!("target_{}", c)),
            r2: r_squared(&t, &p),
            mae: mean_absolute_error(&t, &p),
        })
        .collect();

    let k = per_target.len() as f64;
    let pooled_r2 = per_target.iter().map(|s| s.r2).sum::<f64>() / k;
    let pooled_mae = per_target.iter().map(|s| s.mae).sum::<f64>() / k;

    Ok(EvalScore {
        per_target,
        pooled_r2,
        pooled_mae,
    })
}

/// Coefficient of determination: 1 - ss_res / ss_tot.
///
/// A constant target has zero total sum of squares; R² is defined as 0
/// there rather than dividing by zero.
pub fn r_squared(y_true: &ArrayView1<f64>, y_pred: &ArrayView1<f64>) -> f64 {
    let n = y_true.len() as f64;
    let mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    }
}

pub fn mean_absolute_error(y_true: &ArrayView1<f64>, y_pred: &ArrayView1<f64>) -> f64 {
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Root mean squared error pooled over every cell of the target matrix.
/// This is the per-round loss both model families report during training.
pub fn pooled_rmse(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> f64 {
    let n = y_true.len() as f64;
    let sse: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    (sse / n).sqrt()
}
