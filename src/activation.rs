use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Enum representing different activation function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationType {
    ReLU,
    Linear,
}

impl ActivationType {
    /// Applies the activation function to a single value
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Linear => x,
        }
    }

    /// Computes the derivative of the activation function at a preactivation value
    pub fn derivative(&self, x: f32) -> f32 {
        match self {
            ActivationType::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationType::Linear => 1.0,
        }
    }

    pub fn forward(&self, x: Array1<f32>) -> Array1<f32> {
        match self {
            ActivationType::Linear => x,
            _ => x.mapv_into(|v| self.apply(v)),
        }
    }

    pub fn forward_batch(&self, x: Array2<f32>) -> Array2<f32> {
        match self {
            ActivationType::Linear => x,
            _ => x.mapv_into(|v| self.apply(v)),
        }
    }
}
