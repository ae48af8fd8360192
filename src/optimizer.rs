use ndarray::{Array1, Array2};

use crate::layers::Layer;

/// RMSprop with rho 0.9 and epsilon 1e-7.
#[derive(Debug, Clone)]
pub struct Optimizer {
    pub learning_rate: f32,
    pub rho: f32,
    pub epsilon: f32,
    weight_cache: Vec<Array2<f32>>,
    bias_cache: Vec<Array1<f32>>,
}

impl Optimizer {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            rho: 0.9,
            epsilon: 1e-7,
            weight_cache: Vec::new(),
            bias_cache: Vec::new(),
        }
    }

    /// Applies one update from the gradients accumulated in each layer.
    pub fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        if self.weight_cache.len() != layers.len() {
            self.weight_cache = layers.iter().map(|l| Array2::zeros(l.params().weights.raw_dim())).collect();
            self.bias_cache = layers.iter().map(|l| Array1::zeros(l.params().bias.raw_dim())).collect();
        }

        let (lr, rho, eps) = (self.learning_rate, self.rho, self.epsilon);

        for ((layer, w_cache), b_cache) in layers
            .iter_mut()
            .zip(self.weight_cache.iter_mut())
            .zip(self.bias_cache.iter_mut())
        {
            let params = layer.params_mut();

            w_cache.zip_mut_with(&params.weight_grads, |v, &g| *v = rho * *v + (1.0 - rho) * g * g);
            ndarray::Zip::from(&mut params.weights)
                .and(&params.weight_grads)
                .and(&*w_cache)
                .for_each(|w, &g, &v| *w -= lr * g / (v.sqrt() + eps));

            b_cache.zip_mut_with(&params.bias_grads, |v, &g| *v = rho * *v + (1.0 - rho) * g * g);
            ndarray::Zip::from(&mut params.bias)
                .and(&params.bias_grads)
                .and(&*b_cache)
                .for_each(|b, &g, &v| *b -= lr * g / (v.sqrt() + eps));
        }
    }
}
