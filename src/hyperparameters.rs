use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{OzoneError, Result};

/// Hyperparameters for the regression network
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelHyperparameters {
    /// Neurons in the hidden layer
    pub neurons: usize,

    /// Learning rate for RMSprop
    pub learning_rate: f32,

    /// Carried through the search but not consumed by the network
    pub alpha: f32,
}

impl Default for ModelHyperparameters {
    fn default() -> Self {
        ModelHyperparameters {
            neurons: 2,
            learning_rate: 0.001,
            alpha: 0.3,
        }
    }
}

impl ModelHyperparameters {
    pub fn validate(&self) -> Result<()> {
        if self.neurons == 0 {
            return Err(OzoneError::InvalidHyperparameter("neurons must be positive".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(OzoneError::InvalidHyperparameter(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Options for a single `fit` call, shared by every trial of a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of the rows, taken from the end, held out for validation
    pub validation_split: f64,
    /// Seeds weight init and per-epoch shuffling
    pub seed: u64,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            epochs: 1000,
            batch_size: 32,
            validation_split: 0.2,
            seed: 0,
        }
    }
}

/// Distributions the randomized search samples `ModelHyperparameters` from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamDistributions {
    pub alpha: Vec<f32>,
    /// Half-open range `[neurons_low, neurons_high)`
    pub neurons_low: usize,
    pub neurons_high: usize,
    /// Log-uniform ("reciprocal") range for the learning rate
    pub learning_rate_low: f32,
    pub learning_rate_high: f32,
}

impl Default for ParamDistributions {
    fn default() -> Self {
        ParamDistributions {
            alpha: vec![0.1, 0.2, 0.4, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
            neurons_low: 1,
            neurons_high: 100,
            learning_rate_low: 3e-4,
            learning_rate_high: 3e-2,
        }
    }
}

impl ParamDistributions {
    pub fn validate(&self) -> Result<()> {
        if self.alpha.is_empty() {
            return Err(OzoneError::InvalidSearchSpace("alpha has no candidates".to_string()));
        }
        if self.neurons_low == 0 || self.neurons_low >= self.neurons_high {
            return Err(OzoneError::InvalidSearchSpace(format!(
                "neurons range [{}, {}) is empty or starts at zero",
                self.neurons_low, self.neurons_high
            )));
        }
        let (low, high) = (self.learning_rate_low, self.learning_rate_high);
        if !(low.is_finite() && high.is_finite() && low > 0.0 && low < high) {
            return Err(OzoneError::InvalidSearchSpace(format!(
                "learning rate range [{}, {}] must be positive and increasing",
                low, high
            )));
        }
        Ok(())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ModelHyperparameters> {
        self.validate()?;

        let alpha = *self
            .alpha
            .choose(&mut *rng)
            .ok_or_else(|| OzoneError::InvalidSearchSpace("alpha has no candidates".to_string()))?;
        let neurons = rng.random_range(self.neurons_low..self.neurons_high);
        let log_lr = rng.random_range(self.learning_rate_low.ln()..self.learning_rate_high.ln());

        Ok(ModelHyperparameters {
            neurons,
            learning_rate: log_lr.exp(),
            alpha,
        })
    }
}
