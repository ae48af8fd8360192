use serde::{Deserialize, Serialize};

/// Regression metrics for one pass over a partition.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub loss: f32,
    pub mae: f32,
    pub mse: f32,
}

/// What an observer sees at the end of each epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochLogs {
    pub train: EpochMetrics,
    pub validation: Option<EpochMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<usize>,
    pub train: Vec<EpochMetrics>,
    pub validation: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn record(&mut self, epoch: usize, logs: &EpochLogs) {
        self.epochs.push(epoch);
        self.train.push(logs.train);
        if let Some(validation) = logs.validation {
            self.validation.push(validation);
        }
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn final_loss(&self) -> Option<f32> {
        self.train.last().map(|m| m.loss)
    }

    pub fn final_val_loss(&self) -> Option<f32> {
        self.validation.last().map(|m| m.loss)
    }
}
