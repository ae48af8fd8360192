use crate::activation::ActivationType;
use crate::error::{OzoneError, Result};
use crate::layers::Layer;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::LayerParams;

#[derive(Debug, Clone)]
pub struct FeedForwardLayer {
    pub params: LayerParams,
}

impl FeedForwardLayer {
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        neurons: usize,
        activation: ActivationType,
        rng: &mut R,
    ) -> Result<Self> {
        if inputs == 0 || neurons == 0 {
            return Err(OzoneError::InvalidHyperparameter(format!(
                "layer needs at least one input and one neuron, got {} -> {}",
                inputs, neurons
            )));
        }

        // Assume He normalization
        let std_dev = (2.0 / inputs as f32).sqrt();
        let normal_dist = Normal::new(0.0, std_dev)
            .map_err(|e| OzoneError::InvalidHyperparameter(e.to_string()))?;

        // Initialize weights as (neurons × inputs) for correct matrix multiplication
        let weights: Array2<f32> = Array2::from_shape_fn((neurons, inputs), |_| normal_dist.sample(&mut *rng));

        Ok(Self::from_weights(weights, Array1::zeros(neurons), activation))
    }

    /// Builds a layer around existing parameters, e.g. when reloading an exported model.
    pub fn from_weights(weights: Array2<f32>, bias: Array1<f32>, activation: ActivationType) -> Self {
        let (neurons, inputs) = weights.dim();

        let params = LayerParams {
            neurons,
            inputs,
            weights,
            bias,
            activation,
            weight_grads: Array2::zeros((neurons, inputs)),
            bias_grads: Array1::zeros(neurons),
            activation_cache: Array1::zeros(neurons),
            preactivation_cache: Array1::zeros(neurons),
        };

        FeedForwardLayer { params }
    }
}

impl Layer for FeedForwardLayer {
    fn forward(&mut self, input: &Array1<f32>) -> Array1<f32> {
        assert_eq!(input.len(), self.params.inputs, "Input size does not match layer's input size");

        // weights is (neurons × inputs), input is (inputs), result is (neurons)
        let output = self.params.weights.dot(input) + &self.params.bias;
        self.params.preactivation_cache = output.clone();
        let activated_output = self.params.activation.forward(output);
        self.params.activation_cache = activated_output.clone();
        activated_output
    }

    fn inference(&self, input: ArrayView2<f32>) -> Array2<f32> {
        assert_eq!(input.ncols(), self.params.inputs, "Input size does not match layer's input size");

        // (rows × inputs) · (inputs × neurons) = (rows × neurons)
        let output = input.dot(&self.params.weights.t()) + &self.params.bias;
        self.params.activation.forward_batch(output)
    }

    fn backward(&mut self, input: &Array1<f32>, grad_output: &Array1<f32>) -> Array1<f32> {
        let activation = self.params.activation;
        let dlayer = grad_output * &self.params.preactivation_cache.mapv(|x| activation.derivative(x));

        self.params.bias_grads += &dlayer;

        // dlayer is (neurons), input is (inputs), outer product is (neurons × inputs)
        let dlayer_2d = dlayer.view().insert_axis(Axis(1));
        let input_2d = input.view().insert_axis(Axis(0));
        self.params.weight_grads += &dlayer_2d.dot(&input_2d);

        // weights is (neurons × inputs), dlayer is (neurons), result is (inputs)
        self.params.weights.t().dot(&dlayer)
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }

    fn params(&self) -> &LayerParams {
        &self.params
    }

    fn params_mut(&mut self) -> &mut LayerParams {
        &mut self.params
    }

    fn zero_grads(&mut self) {
        self.params.weight_grads.fill(0.0);
        self.params.bias_grads.fill(0.0);
    }

    fn scale_grads(&mut self, factor: f32) {
        self.params.weight_grads *= factor;
        self.params.bias_grads *= factor;
    }
}
