use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Loss {
    MeanSquaredError,
}

impl Loss {
    pub fn calculate(&self, prediction: &Array1<f32>, target: &Array1<f32>) -> f32 {
        match self {
            Loss::MeanSquaredError => mean_squared_error(prediction.view(), target.view()),
        }
    }

    /// Gradient of the loss with respect to the prediction.
    pub fn gradient(&self, prediction: &Array1<f32>, target: &Array1<f32>) -> Array1<f32> {
        match self {
            Loss::MeanSquaredError => {
                let n = prediction.len().max(1) as f32;
                (prediction - target) * (2.0 / n)
            }
        }
    }
}

pub fn mean_squared_error(prediction: ArrayView1<f32>, target: ArrayView1<f32>) -> f32 {
    if prediction.is_empty() {
        return 0.0;
    }
    let sum: f64 = prediction
        .iter()
        .zip(target.iter())
        .map(|(&p, &t)| {
            let diff = (p - t) as f64;
            diff * diff
        })
        .sum();
    (sum / prediction.len() as f64) as f32
}

pub fn mean_absolute_error(prediction: ArrayView1<f32>, target: ArrayView1<f32>) -> f32 {
    if prediction.is_empty() {
        return 0.0;
    }
    let sum: f64 = prediction
        .iter()
        .zip(target.iter())
        .map(|(&p, &t)| ((p - t) as f64).abs())
        .sum();
    (sum / prediction.len() as f64) as f32
}
