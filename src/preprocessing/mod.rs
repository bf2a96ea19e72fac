//! Feature normalization

pub mod scaler;

pub use scaler::ScalerStats;
