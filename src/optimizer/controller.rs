//! The hyperparameter search loop

use crate::error::{Result, ScorecastError};
use crate::optimizer::config::{OptimizeDirection, SearchConfig};
use crate::optimizer::samplers::{create_sampler, Sampler};
use crate::optimizer::search_space::{SearchSpace, TrialParams};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// What one successful trial reports back to the controller.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub score: f64,
    pub best_round: usize,
    pub rounds_run: usize,
}

/// The record kept for every proposed configuration, diverged ones
/// included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial_id: usize,
    pub params: TrialParams,
    pub score: f64,
    pub best_round: Option<usize>,
    pub rounds_run: Option<usize>,
    pub duration_secs: f64,
    pub diverged: bool,
}

/// All evaluated configurations in proposal order plus the winner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub trials: Vec<TrialRecord>,
    pub best_trial_idx: Option<usize>,
    pub total_duration_secs: f64,
    pub direction: OptimizeDirection,
}

impl SearchResult {
    pub fn new(direction: OptimizeDirection) -> Self {
        Self {
            trials: Vec::new(),
            best_trial_idx: None,
            total_duration_secs: 0.0,
            direction,
        }
    }

    pub fn best_trial(&self) -> Option<&TrialRecord> {
        self.best_trial_idx.map(|idx| &self.trials[idx])
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_trial().map(|t| t.score)
    }

    pub fn best_params(&self) -> Option<&TrialParams> {
        self.best_trial().map(|t| &t.params)
    }

    /// Record a trial. Only a strict improvement displaces the current
    /// best, so equal scores keep the earlier-proposed configuration.
    pub fn add_trial(&mut self, record: TrialRecord) {
        let idx = self.trials.len();

        let is_better = !record.diverged
            && match self.best_trial_idx {
                None => true,
                Some(best_idx) => {
                    let best = self.trials[best_idx].score;
                    match self.direction {
                        OptimizeDirection::Minimize => record.score < best,
                        OptimizeDirection::Maximize => record.score > best,
                    }
                }
            };

        if is_better {
            self.best_trial_idx = Some(idx);
        }

        self.trials.push(record);
    }
}

/// Proposes configurations, delegates each to an objective, and retains
/// the best-scoring one.
pub struct SearchController {
    config: SearchConfig,
    space: SearchSpace,
    sampler: Box<dyn Sampler>,
    result: SearchResult,
}

impl SearchController {
    pub fn new(config: SearchConfig, space: SearchSpace) -> Self {
        let sampler = create_sampler(config.sampler, config.seed);
        let result = SearchResult::new(config.direction);
        Self {
            config,
            space,
            sampler,
            result,
        }
    }

    /// Run up to `n_trials` trials (fewer if the time budget expires).
    ///
    /// The objective receives the trial id and the proposed configuration.
    /// A `TrainingDiverged` error is recovered locally: the trial is
    /// recorded with the worst possible score and the search continues.
    /// Every other error aborts the search. If no trial produced a valid
    /// model, `SearchExhaustedNoValidModel` is returned.
    pub fn run<F>(&mut self, mut objective: F) -> Result<&SearchResult>
    where
        F: FnMut(usize, &TrialParams) -> Result<TrialOutcome>,
    {
        let start = Instant::now();
        let mut history: Vec<(TrialParams, f64)> = Vec::new();

        for trial_id in 0..self.config.n_trials {
            if let Some(budget) = self.config.timeout_secs {
                if start.elapsed().as_secs_f64() > budget {
                    tracing::info!(
                        completed = trial_id,
                        "time budget expired, skipping remaining trials"
                    );
                    break;
                }
            }

            let trial_start = Instant::now();
            let params = self
                .sampler
                .sample(&self.space, &history, self.config.direction);
            self.space.validate(&params)?;

            let record = match objective(trial_id, &params) {
                Ok(outcome) => {
                    history.push((params.clone(), outcome.score));
                    TrialRecord {
                        trial_id,
                        params,
                        score: outcome.score,
                        best_round: Some(outcome.best_round),
                        rounds_run: Some(outcome.rounds_run),
                        duration_secs: trial_start.elapsed().as_secs_f64(),
                        diverged: false,
                    }
                }
                Err(ScorecastError::TrainingDiverged { round, reason }) => {
                    tracing::warn!(trial_id, round, %reason, "trial diverged");
                    let worst = match self.config.direction {
                        OptimizeDirection::Minimize => f64::INFINITY,
                        OptimizeDirection::Maximize => f64::NEG_INFINITY,
                    };
                    TrialRecord {
                        trial_id,
                        params,
                        score: worst,
                        best_round: None,
                        rounds_run: None,
                        duration_secs: trial_start.elapsed().as_secs_f64(),
                        diverged: true,
                    }
                }
                Err(other) => return Err(other),
            };

            tracing::info!(
                trial_id,
                score = record.score,
                diverged = record.diverged,
                best = self.result.best_score().unwrap_or(record.score),
                "trial finished"
            );
            self.result.add_trial(record);
        }

        self.result.total_duration_secs = start.elapsed().as_secs_f64();

        if self.result.best_trial_idx.is_none() {
            return Err(ScorecastError::SearchExhaustedNoValidModel);
        }

        Ok(&self.result)
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::samplers::SamplerKind;

    fn space() -> SearchSpace {
        SearchSpace::new().float("x", -5.0, 5.0)
    }

    fn config(n_trials: usize) -> SearchConfig {
        SearchConfig::new()
            .with_n_trials(n_trials)
            .with_sampler(SamplerKind::Random)
            .with_direction(OptimizeDirection::Maximize)
            .with_seed(42)
    }

    fn outcome(score: f64) -> TrialOutcome {
        TrialOutcome {
            score,
            best_round: 1,
            rounds_run: 1,
        }
    }

    #[test]
    fn test_runs_full_budget() {
        let mut controller = SearchController::new(config(15), space());
        let result = controller
            .run(|_, params| {
                let x = params["x"].as_float().unwrap();
                Ok(outcome(-(x * x)))
            })
            .unwrap();

        assert_eq!(result.trials.len(), 15);
        assert!(result.best_score().unwrap() <= 0.0);
    }

    #[test]
    fn test_reproducible_proposals() {
        let run = || {
            let mut controller = SearchController::new(config(10), space());
            controller
                .run(|_, params| Ok(outcome(params["x"].as_float().unwrap())))
                .unwrap();
            controller.result().clone()
        };

        let a = run();
        let b = run();
        for (ta, tb) in a.trials.iter().zip(b.trials.iter()) {
            assert_eq!(ta.params, tb.params);
        }
        assert_eq!(a.best_trial_idx, b.best_trial_idx);
    }

    #[test]
    fn test_tie_break_prefers_earlier_trial() {
        let mut controller = SearchController::new(config(8), space());
        let result = controller.run(|_, _| Ok(outcome(1.0))).unwrap();
        assert_eq!(result.best_trial_idx, Some(0));
    }

    #[test]
    fn test_divergence_is_recovered() {
        let mut controller = SearchController::new(config(6), space());
        let result = controller
            .run(|trial_id, _| {
                if trial_id % 2 == 0 {
                    Err(ScorecastError::TrainingDiverged {
                        round: 0,
                        reason: "test".to_string(),
                    })
                } else {
                    Ok(outcome(trial_id as f64))
                }
            })
            .unwrap();

        assert_eq!(result.trials.len(), 6);
        assert_eq!(result.trials.iter().filter(|t| t.diverged).count(), 3);
        // best is the highest-scoring non-diverged trial
        assert_eq!(result.best_trial().unwrap().trial_id, 5);
    }

    #[test]
    fn test_all_diverged_is_fatal() {
        let mut controller = SearchController::new(config(4), space());
        let result = controller.run(|_, _| {
            Err(ScorecastError::TrainingDiverged {
                round: 0,
                reason: "test".to_string(),
            })
        });
        assert!(matches!(
            result,
            Err(ScorecastError::SearchExhaustedNoValidModel)
        ));
    }

    #[test]
    fn test_other_errors_abort() {
        let mut controller = SearchController::new(config(4), space());
        let result = controller.run(|_, _| {
            Err(ScorecastError::DataError("broken".to_string()))
        });
        assert!(matches!(result, Err(ScorecastError::DataError(_))));
    }

    #[test]
    fn test_diverged_trial_never_selected() {
        let mut controller = SearchController::new(config(3), space());
        // diverged trials carry -inf score under maximize; a real trial
        // with a terrible score must still beat them
        let result = controller
            .run(|trial_id, _| {
                if trial_id == 1 {
                    Ok(outcome(-1e9))
                } else {
                    Err(ScorecastError::TrainingDiverged {
                        round: 0,
                        reason: "test".to_string(),
                    })
                }
            })
            .unwrap();
        assert_eq!(result.best_trial().unwrap().trial_id, 1);
    }
}
