//! Standard-score feature scaling

use crate::data::NumericTable;
use crate::error::{Result, ScorecastError};
use ndarray::Axis;
use serde::{Deserialize, Serialize};

/// Per-column scaling statistics, fitted on the train partition only.
///
/// `transform` is pure given the fitted statistics; the eval partition and
/// any later inference input are scaled with the same values, never refit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerStats {
    columns: Vec<String>,
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl ScalerStats {
    /// Fit means and standard deviations from the given table.
    ///
    /// Columns with zero or near-zero variance get a unit scale so the
    /// transform is a finite no-op for them.
    pub fn fit(table: &NumericTable) -> Result<Self> {
        let n = table.n_rows();
        if n == 0 {
            return Err(ScorecastError::EmptyDataset(
                "cannot fit scaling statistics on an empty table".to_string(),
            ));
        }

        let mut means = Vec::with_capacity(table.n_cols());
        let mut stds = Vec::with_capacity(table.n_cols());

        for col in table.values.axis_iter(Axis(1)) {
            let mean = col.sum() / n as f64;
            let std = if n > 1 {
                let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
                var.sqrt()
            } else {
                0.0
            };
            means.push(mean);
            stds.push(if std > 1e-12 { std } else { 1.0 });
        }

        Ok(Self {
            columns: table.names.clone(),
            means,
            stds,
        })
    }

    /// Apply the fitted statistics to a table with the same column set.
    pub fn transform(&self, table: &NumericTable) -> Result<NumericTable> {
        if table.names != self.columns {
            return Err(ScorecastError::DimensionMismatch {
                expected: format!("columns {:?}", self.columns),
                actual: format!("columns {:?}", table.names),
            });
        }

        let mut values = table.values.clone();
        for (c, mut col) in values.axis_iter_mut(Axis(1)).enumerate() {
            let mean = self.means[c];
            let std = self.stds[c];
            col.mapv_inplace(|v| (v - mean) / std);
        }

        Ok(NumericTable {
            names: table.names.clone(),
            values,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}
