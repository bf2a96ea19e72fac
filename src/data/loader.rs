//! Dataset loading and numeric column extraction

use crate::error::{Result, ScorecastError};
use ndarray::Array2;
use polars::prelude::*;
use std::fs::File;

/// A rectangular block of named numeric columns, rows aligned by position.
///
/// This is the in-memory form the pipeline works with once the DataFrame
/// boundary has been crossed: row-major `f64` values plus the column names
/// they were extracted from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NumericTable {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl NumericTable {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }
}

/// Load a headered CSV file into a DataFrame.
pub fn load_csv(path: &str) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| ScorecastError::DataError(e.to_string()))?;

    let reader = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file);

    reader
        .finish()
        .map_err(|e| ScorecastError::DataError(e.to_string()))
}

/// Split a DataFrame into a feature table and a target table.
///
/// The target columns are held out of the feature set; every remaining
/// column becomes a feature. Column order follows the DataFrame.
pub fn extract_features_targets(
    df: &DataFrame,
    target_columns: &[String],
) -> Result<(NumericTable, NumericTable)> {
    if df.height() == 0 {
        return Err(ScorecastError::EmptyDataset(
            "dataset has no rows".to_string(),
        ));
    }

    for target in target_columns {
        if df.column(target).is_err() {
            return Err(ScorecastError::ColumnNotFound(target.clone()));
        }
    }

    let feature_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| !target_columns.iter().any(|t| t == name.as_str()))
        .map(|s| s.to_string())
        .collect();

    if feature_names.is_empty() {
        return Err(ScorecastError::EmptyDataset(
            "dataset has no feature columns besides the targets".to_string(),
        ));
    }

    let features = NumericTable {
        values: columns_to_array2(df, &feature_names)?,
        names: feature_names,
    };
    let targets = NumericTable {
        values: columns_to_array2(df, target_columns)?,
        names: target_columns.to_vec(),
    };

    Ok((features, targets))
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
/// Collects each column contiguously first, then assembles via
/// `from_shape_fn` for cache-friendly construction from column-major data.
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| ScorecastError::ColumnNotFound(col_name.clone()))?;
            let series_f64 = series
                .cast(&DataType::Float64)
                .map_err(|e| ScorecastError::DataError(e.to_string()))?;
            let values: Vec<f64> = series_f64
                .f64()
                .map_err(|e| ScorecastError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn test_df() -> DataFrame {
        df!(
            "f1" => &[1.0, 2.0, 3.0],
            "f2" => &[4.0, 5.0, 6.0],
            "home" => &[2.0, 3.0, 4.0],
            "away" => &[1.0, 0.0, 5.0]
        )
        .unwrap()
    }

    #[test]
    fn test_extract_holds_out_targets() {
        let df = test_df();
        let targets = vec!["home".to_string(), "away".to_string()];
        let (features, target_table) = extract_features_targets(&df, &targets).unwrap();

        assert_eq!(features.names, vec!["f1", "f2"]);
        assert_eq!(features.values.dim(), (3, 2));
        assert_eq!(target_table.names, vec!["home", "away"]);
        assert_eq!(target_table.values[[0, 0]], 2.0);
        assert_eq!(target_table.values[[2, 1]], 5.0);
    }

    #[test]
    fn test_missing_target_column() {
        let df = test_df();
        let targets = vec!["home".to_string(), "nope".to_string()];
        let result = extract_features_targets(&df, &targets);
        assert!(matches!(result, Err(ScorecastError::ColumnNotFound(_))));
    }

    #[test]
    fn test_empty_dataset() {
        let df = df!("a" => Vec::<f64>::new(), "b" => Vec::<f64>::new()).unwrap();
        let targets = vec!["a".to_string()];
        let result = extract_features_targets(&df, &targets);
        assert!(matches!(result, Err(ScorecastError::EmptyDataset(_))));
    }

    #[test]
    fn test_load_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2,3").unwrap();
        writeln!(file, "4,5,6").unwrap();

        let df = load_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }
}
