//! Search space definition for hyperparameters

use crate::error::{Result, ScorecastError};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type and bounds of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterType {
    /// Continuous parameter, linearly or log-uniformly sampled
    Float { low: f64, high: f64, log_scale: bool },
    /// Integer parameter, uniformly sampled over [low, high]
    Int { low: i64, high: i64 },
    /// Categorical parameter over a fixed choice list
    Categorical { choices: Vec<String> },
}

/// A single named hyperparameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParameterType,
}

impl Parameter {
    pub fn float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Float {
                low,
                high,
                log_scale: false,
            },
        }
    }

    pub fn log_float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Float {
                low,
                high,
                log_scale: true,
            },
        }
    }

    pub fn int(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Int { low, high },
        }
    }

    pub fn categorical(name: impl Into<String>, choices: Vec<&str>) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Categorical {
                choices: choices.into_iter().map(String::from).collect(),
            },
        }
    }

    /// Sample a value uniformly (log-uniformly for log-scale floats).
    pub fn sample(&self, rng: &mut impl Rng) -> ParameterValue {
        match &self.param_type {
            ParameterType::Float {
                low,
                high,
                log_scale,
            } => {
                let val = if *log_scale {
                    let log_low = low.ln();
                    let log_high = high.ln();
                    (rng.gen::<f64>() * (log_high - log_low) + log_low).exp()
                } else {
                    rng.gen::<f64>() * (high - low) + low
                };
                ParameterValue::Float(val)
            }
            ParameterType::Int { low, high } => {
                ParameterValue::Int(rng.gen_range(*low..=*high))
            }
            ParameterType::Categorical { choices } => {
                let idx = rng.gen_range(0..choices.len());
                ParameterValue::Str(choices[idx].clone())
            }
        }
    }

    /// Check a value against this parameter's type and bounds.
    pub fn validate(&self, value: &ParameterValue) -> Result<()> {
        let ok = match (&self.param_type, value) {
            (ParameterType::Float { low, high, .. }, ParameterValue::Float(v)) => {
                *v >= *low && *v <= *high
            }
            (ParameterType::Int { low, high }, ParameterValue::Int(v)) => {
                *v >= *low && *v <= *high
            }
            (ParameterType::Categorical { choices }, ParameterValue::Str(v)) => {
                choices.iter().any(|c| c == v)
            }
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            Err(ScorecastError::InvalidHyperparameter {
                name: self.name.clone(),
                value: format!("{:?}", value),
                reason: format!("outside declared bounds {:?}", self.param_type),
            })
        }
    }
}

/// A sampled parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
    Int(i64),
    Str(String),
}

impl ParameterValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// One sampled configuration: parameter name to value.
pub type TrialParams = HashMap<String, ParameterValue>;

/// The declared search space for one model family.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSpace {
    parameters: Vec<Parameter>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::float(name, low, high))
    }

    pub fn log_float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::log_float(name, low, high))
    }

    pub fn int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(Parameter::int(name, low, high))
    }

    pub fn categorical(self, name: impl Into<String>, choices: Vec<&str>) -> Self {
        self.add(Parameter::categorical(name, choices))
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Sample one full configuration.
    pub fn sample(&self, rng: &mut impl Rng) -> TrialParams {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.sample(rng)))
            .collect()
    }

    /// Check that every value of a configuration lies within its declared
    /// bounds and that no undeclared parameter sneaked in.
    pub fn validate(&self, params: &TrialParams) -> Result<()> {
        for (name, value) in params {
            let param = self
                .parameters
                .iter()
                .find(|p| &p.name == name)
                .ok_or_else(|| ScorecastError::InvalidHyperparameter {
                    name: name.clone(),
                    value: format!("{:?}", value),
                    reason: "not declared in the search space".to_string(),
                })?;
            param.validate(value)?;
        }
        Ok(())
    }
}
