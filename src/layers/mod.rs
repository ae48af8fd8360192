pub mod feed_forward;

use std::fmt::Debug;
use ndarray::{Array1, Array2, ArrayView2};
use crate::activation::ActivationType;

#[derive(Debug, Clone)]
pub struct LayerParams {
    pub neurons: usize,
    pub inputs: usize,
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
    pub activation: ActivationType,
    pub weight_grads: Array2<f32>,
    pub bias_grads: Array1<f32>,
    pub activation_cache: Array1<f32>,
    pub preactivation_cache: Array1<f32>,
}

pub trait Layer: Debug {
    /// Single-sample forward pass that fills the caches used by `backward`.
    fn forward(&mut self, input: &Array1<f32>) -> Array1<f32>;

    /// Cache-free forward pass over a batch of rows.
    fn inference(&self, input: ArrayView2<f32>) -> Array2<f32>;

    /// Accumulates gradients for this layer and returns the gradient
    /// with respect to its input.
    fn backward(&mut self, input: &Array1<f32>, grad_output: &Array1<f32>) -> Array1<f32>;

    fn clone_box(&self) -> Box<dyn Layer>;

    fn params(&self) -> &LayerParams;
    fn params_mut(&mut self) -> &mut LayerParams;

    fn zero_grads(&mut self);
    fn scale_grads(&mut self, factor: f32);
}

impl Clone for Box<dyn Layer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub use feed_forward::FeedForwardLayer;
