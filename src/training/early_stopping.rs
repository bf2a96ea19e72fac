//! Early-stopped round-by-round training
//!
//! Drives an iterative model until the eval loss stops improving for a
//! patience window, and returns the model as of its best round rather
//! than its final round.

use crate::error::{Result, ScorecastError};
use crate::training::model::{FittedModel, IterativeModel};

/// What one observed round did to the stopping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopState {
    /// Strictly lower eval loss than any round before it
    Improved,
    /// No improvement; the stall counter grew
    Stalled,
    /// The stall counter reached the patience window
    Stopped,
}

/// The stopping rule itself: best loss/round so far plus the stall
/// counter. Owned by a single training run and discarded with it.
#[derive(Debug, Clone)]
pub struct StoppingRule {
    patience: usize,
    best_loss: f64,
    best_round: usize,
    stall: usize,
}

impl StoppingRule {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss: f64::INFINITY,
            best_round: 0,
            stall: 0,
        }
    }

    /// Feed one round's eval loss; rounds are 1-based.
    pub fn observe(&mut self, round: usize, loss: f64) -> StopState {
        let improved = loss < self.best_loss;
        if improved {
            self.best_loss = loss;
            self.best_round = round;
            self.stall = 0;
        } else {
            self.stall += 1;
        }

        if self.stall >= self.patience {
            StopState::Stopped
        } else if improved {
            StopState::Improved
        } else {
            StopState::Stalled
        }
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_round(&self) -> usize {
        self.best_round
    }
}

/// Terminal output of one early-stopped training run.
#[derive(Debug)]
pub struct TrainOutcome {
    /// Snapshot of the model at its best round, not its final round
    pub model: FittedModel,
    pub best_loss: f64,
    /// 1-based round index the snapshot was taken at
    pub best_round: usize,
    /// Rounds actually executed before stopping
    pub rounds_run: usize,
}

/// Train until `patience` consecutive non-improving rounds or until
/// `max_rounds` is exhausted, whichever comes first.
///
/// A non-finite loss or a failing round aborts the run with
/// `TrainingDiverged` carrying the last stable round.
pub fn fit_with_early_stopping(
    session: &mut dyn IterativeModel,
    max_rounds: usize,
    patience: usize,
) -> Result<TrainOutcome> {
    let mut rule = StoppingRule::new(patience.max(1));
    let mut best: Option<FittedModel> = None;
    let mut rounds_run = 0;

    for round in 1..=max_rounds {
        let loss = match session.step() {
            Ok(loss) => loss,
            Err(e) => {
                return Err(ScorecastError::TrainingDiverged {
                    round: rule.best_round(),
                    reason: e.to_string(),
                })
            }
        };
        rounds_run = round;

        if !loss.is_finite() {
            return Err(ScorecastError::TrainingDiverged {
                round: rule.best_round(),
                reason: "non-finite evaluation loss".to_string(),
            });
        }

        match rule.observe(round, loss) {
            StopState::Improved => {
                best = Some(session.snapshot());
            }
            StopState::Stalled => {}
            StopState::Stopped => {
                if rule.best_round() == round {
                    best = Some(session.snapshot());
                }
                tracing::debug!(
                    round,
                    best_round = rule.best_round(),
                    best_loss = rule.best_loss(),
                    "stopping: patience exhausted"
                );
                break;
            }
        }
    }

    let model = best.ok_or(ScorecastError::ModelNotFitted)?;
    Ok(TrainOutcome {
        model,
        best_loss: rule.best_loss(),
        best_round: rule.best_round(),
        rounds_run,
    })
}
