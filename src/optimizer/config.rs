//! Search configuration

use crate::optimizer::samplers::SamplerKind;
use serde::{Deserialize, Serialize};

/// Direction of the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizeDirection {
    Minimize,
    Maximize,
}

/// Configuration for one hyperparameter search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Trial budget
    pub n_trials: usize,

    /// Wall-clock budget; expiry skips the remaining trials
    pub timeout_secs: Option<f64>,

    pub direction: OptimizeDirection,

    pub sampler: SamplerKind,

    /// Base seed; the sampler and each trial derive from it
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_trials: 100,
            timeout_secs: None,
            direction: OptimizeDirection::Maximize,
            sampler: SamplerKind::Tpe,
            seed: 42,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_trials(mut self, n: usize) -> Self {
        self.n_trials = n;
        self
    }

    pub fn with_timeout(mut self, secs: f64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_direction(mut self, direction: OptimizeDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerKind) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.n_trials, 100);
        assert_eq!(config.direction, OptimizeDirection::Maximize);
    }

    #[test]
    fn test_builder() {
        let config = SearchConfig::new()
            .with_n_trials(20)
            .with_sampler(SamplerKind::Random)
            .with_seed(7);
        assert_eq!(config.n_trials, 20);
        assert_eq!(config.sampler, SamplerKind::Random);
        assert_eq!(config.seed, 7);
    }
}
