//! Deterministic train/eval partitioning

use crate::data::loader::NumericTable;
use crate::error::{Result, ScorecastError};
use ndarray::{Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// One side of a dataset split: features with their column names, plus the
/// target matrix (one column per target) for the same rows.
#[derive(Debug, Clone)]
pub struct Partition {
    pub features: NumericTable,
    pub targets: Array2<f64>,
}

impl Partition {
    pub fn n_rows(&self) -> usize {
        self.features.n_rows()
    }
}

/// A train/eval split of the dataset, produced once per run.
///
/// The row index lists record which source rows landed on each side;
/// together they are a permutation of `0..n`.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Partition,
    pub eval: Partition,
    pub train_indices: Vec<usize>,
    pub eval_indices: Vec<usize>,
    pub target_names: Vec<String>,
}

/// Split features/targets into disjoint train and eval partitions.
///
/// Row assignment is a pseudo-random shuffle keyed by `seed`; the first
/// `ceil((1 - eval_fraction) * n)` shuffled rows form the train partition.
/// The same `(table, eval_fraction, seed)` triple always yields the same
/// membership.
pub fn split_dataset(
    features: &NumericTable,
    targets: &NumericTable,
    eval_fraction: f64,
    seed: u64,
) -> Result<DatasetSplit> {
    let n = features.n_rows();
    if n == 0 {
        return Err(ScorecastError::EmptyDataset(
            "cannot split a dataset with no rows".to_string(),
        ));
    }
    if targets.n_rows() != n {
        return Err(ScorecastError::DimensionMismatch {
            expected: format!("{} target rows", n),
            actual: format!("{} target rows", targets.n_rows()),
        });
    }
    if !(eval_fraction > 0.0 && eval_fraction < 1.0) {
        return Err(ScorecastError::InvalidSplitFraction(eval_fraction));
    }

    let train_size = ((1.0 - eval_fraction) * n as f64).ceil() as usize;
    if train_size == 0 || train_size == n {
        return Err(ScorecastError::InvalidSplitFraction(eval_fraction));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_indices = indices[..train_size].to_vec();
    let eval_indices = indices[train_size..].to_vec();

    Ok(DatasetSplit {
        train: take_partition(features, targets, &train_indices),
        eval: take_partition(features, targets, &eval_indices),
        train_indices,
        eval_indices,
        target_names: targets.names.clone(),
    })
}

fn take_partition(features: &NumericTable, targets: &NumericTable, rows: &[usize]) -> Partition {
    Partition {
        features: NumericTable {
            names: features.names.clone(),
            values: features.values.select(Axis(0), rows),
        },
        targets: targets.values.select(Axis(0), rows),
    }
}
