//! Hyperparameter search
//!
//! A declared search space, proposal samplers (random and TPE-style),
//! and the sequential trial controller with deterministic tie-breaking.

pub mod config;
pub mod controller;
pub mod samplers;
pub mod search_space;

pub use config::{OptimizeDirection, SearchConfig};
pub use controller::{SearchController, SearchResult, TrialOutcome, TrialRecord};
pub use samplers::{create_sampler, RandomSampler, Sampler, SamplerKind, TpeSampler};
pub use search_space::{Parameter, ParameterType, ParameterValue, SearchSpace, TrialParams};
