//! Dataset ingestion and partitioning

pub mod loader;
pub mod partition;

pub use loader::{extract_features_targets, load_csv, NumericTable};
pub use partition::{split_dataset, DatasetSplit, Partition};
