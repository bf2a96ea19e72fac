//! Proposal strategies for the search controller

use crate::optimizer::config::OptimizeDirection;
use crate::optimizer::search_space::{ParameterValue, SearchSpace, TrialParams};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Which proposal strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerKind {
    /// Uniform random proposals
    Random,
    /// Random startup trials, then proposals biased toward the
    /// best-scoring region of the history
    Tpe,
}

/// Proposes the next configuration given the scored history so far.
pub trait Sampler: Send {
    fn sample(
        &mut self,
        space: &SearchSpace,
        history: &[(TrialParams, f64)],
        direction: OptimizeDirection,
    ) -> TrialParams;
}

pub fn create_sampler(kind: SamplerKind, seed: u64) -> Box<dyn Sampler> {
    match kind {
        SamplerKind::Random => Box::new(RandomSampler::new(seed)),
        SamplerKind::Tpe => Box::new(TpeSampler::new(seed)),
    }
}

/// Uniform random sampler.
pub struct RandomSampler {
    rng: Xoshiro256PlusPlus,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl Sampler for RandomSampler {
    fn sample(
        &mut self,
        space: &SearchSpace,
        _history: &[(TrialParams, f64)],
        _direction: OptimizeDirection,
    ) -> TrialParams {
        space.sample(&mut self.rng)
    }
}

/// TPE-style sampler: after `n_startup_trials` random proposals, draws a
/// candidate batch and keeps the one most similar to the best gamma
/// fraction of the history.
pub struct TpeSampler {
    rng: Xoshiro256PlusPlus,
    n_startup_trials: usize,
    gamma: f64,
    n_candidates: usize,
}

impl TpeSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            n_startup_trials: 10,
            gamma: 0.25,
            n_candidates: 24,
        }
    }

    pub fn with_n_startup(mut self, n: usize) -> Self {
        self.n_startup_trials = n;
        self
    }

    fn similarity(candidate: &TrialParams, good: &[&TrialParams]) -> f64 {
        if good.is_empty() {
            return 0.0;
        }

        let mut total = 0.0;
        for params in good {
            let mut dist = 0.0;
            let mut count = 0;
            for (key, val) in candidate {
                if let Some(other) = params.get(key) {
                    let d = param_distance(val, other);
                    dist += d * d;
                    count += 1;
                }
            }
            if count > 0 {
                dist = (dist / count as f64).sqrt();
                total += 1.0 / (1.0 + dist);
            }
        }
        total / good.len() as f64
    }
}

impl Sampler for TpeSampler {
    fn sample(
        &mut self,
        space: &SearchSpace,
        history: &[(TrialParams, f64)],
        direction: OptimizeDirection,
    ) -> TrialParams {
        if history.len() < self.n_startup_trials {
            return space.sample(&mut self.rng);
        }

        let mut sorted: Vec<&(TrialParams, f64)> = history.iter().collect();
        sorted.sort_by(|a, b| {
            let ord = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
            match direction {
                OptimizeDirection::Minimize => ord,
                OptimizeDirection::Maximize => ord.reverse(),
            }
        });

        let n_good = ((sorted.len() as f64 * self.gamma).ceil() as usize).max(1);
        let good: Vec<&TrialParams> = sorted[..n_good].iter().map(|(p, _)| p).collect();

        let mut best_params = space.sample(&mut self.rng);
        let mut best_score = Self::similarity(&best_params, &good);

        for _ in 1..self.n_candidates {
            let candidate = space.sample(&mut self.rng);
            let score = Self::similarity(&candidate, &good);
            if score > best_score {
                best_score = score;
                best_params = candidate;
            }
        }

        best_params
    }
}

fn param_distance(a: &ParameterValue, b: &ParameterValue) -> f64 {
    match (a, b) {
        (ParameterValue::Float(va), ParameterValue::Float(vb)) => (va - vb).abs(),
        (ParameterValue::Int(va), ParameterValue::Int(vb)) => (va - vb).abs() as f64,
        (ParameterValue::Str(va), ParameterValue::Str(vb)) => {
            if va == vb {
                0.0
            } else {
                1.0
            }
        }
        _ => 1.0,
    }
}
