use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::activation::ActivationType;
use crate::callbacks::EpochObserver;
use crate::error::{OzoneError, Result};
use crate::history::{EpochLogs, EpochMetrics, TrainingHistory};
use crate::hyperparameters::{FitOptions, ModelHyperparameters};
use crate::layers::{FeedForwardLayer, Layer};
use crate::loss::{mean_absolute_error, mean_squared_error};
use crate::{Loss, Optimizer};

#[derive(Debug, Clone)]
pub struct Model {
    pub layers: Vec<Box<dyn Layer>>,
    pub loss: Loss,
    pub optimizer: Optimizer,
}

pub struct LayerConfig {
    pub neurons: usize,
    pub inputs: usize,
    pub activation: ActivationType,
}

impl Model {
    /// Create a new neural network model with specified layer configurations
    ///
    /// # Arguments
    ///
    /// * `layer_configs` - One entry per dense layer, input side first
    /// * `loss` - Objective minimised by `fit`
    /// * `optimizer` - Update rule applied after every mini-batch
    /// * `seed` - Seeds the weight initialisation
    pub fn new(
        layer_configs: Vec<LayerConfig>,
        loss: Loss,
        optimizer: Optimizer,
        seed: u64,
    ) -> Result<Self> {
        if layer_configs.len() < 2 {
            return Err(OzoneError::InvalidHyperparameter(
                "At least two layers (hidden and output) are required".to_string(),
            ));
        }
        for pair in layer_configs.windows(2) {
            if pair[1].inputs != pair[0].neurons {
                return Err(OzoneError::ShapeMismatch {
                    expected: pair[0].neurons,
                    actual: pair[1].inputs,
                });
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(layer_configs.len());
        for config in layer_configs {
            let layer = FeedForwardLayer::new(
                config.inputs,   // Number of input from previous layer
                config.neurons,  // Number of neurons in current layer
                config.activation,
                &mut rng,
            )?;
            layers.push(Box::new(layer));
        }

        Ok(Model {
            layers,
            loss,
            optimizer,
        })
    }

    /// `inputs -> neurons (ReLU) -> 1 (Linear)` trained on mean squared error with RMSprop.
    pub fn regressor(inputs: usize, hyperparameters: &ModelHyperparameters, seed: u64) -> Result<Self> {
        hyperparameters.validate()?;

        Self::new(
            vec![
                LayerConfig { inputs, neurons: hyperparameters.neurons, activation: ActivationType::ReLU },
                LayerConfig { inputs: hyperparameters.neurons, neurons: 1, activation: ActivationType::Linear },
            ],
            Loss::MeanSquaredError,
            Optimizer::new(hyperparameters.learning_rate),
            seed,
        )
    }

    /// Wraps already-trained layers, e.g. from an exported model.
    pub fn from_layers(layers: Vec<Box<dyn Layer>>, loss: Loss, optimizer: Optimizer) -> Result<Self> {
        if layers.is_empty() {
            return Err(OzoneError::InvalidHyperparameter("model has no layers".to_string()));
        }
        for pair in layers.windows(2) {
            if pair[1].params().inputs != pair[0].params().neurons {
                return Err(OzoneError::ShapeMismatch {
                    expected: pair[0].params().neurons,
                    actual: pair[1].params().inputs,
                });
            }
        }
        Ok(Model { layers, loss, optimizer })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.params().inputs)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.params().neurons)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.params().weights.len() + l.params().bias.len())
            .sum()
    }

    pub fn forward(&mut self, input: &Array1<f32>) -> Array1<f32> {
        let mut current_input = input.clone();
        for layer in &mut self.layers {
            current_input = layer.forward(&current_input);
        }
        current_input
    }

    /// Accumulates gradients for one sample. `forward` must have run on
    /// the same input so the layer caches are current.
    pub fn backward(&mut self, input: &Array1<f32>, output: &Array1<f32>, target: &Array1<f32>) {
        let mut grad = self.loss.gradient(output, target);

        for i in (0..self.layers.len()).rev() {
            let layer_input = if i == 0 {
                input.clone()
            } else {
                self.layers[i - 1].params().activation_cache.clone()
            };
            grad = self.layers[i].backward(&layer_input, &grad);
        }
    }

    /// One optimizer step on the mean gradient of the batch. Returns the mean loss.
    pub fn train_batch(&mut self, inputs: ArrayView2<f32>, targets: ArrayView1<f32>) -> f32 {
        for layer in &mut self.layers {
            layer.zero_grads();
        }

        let mut total_loss: f32 = 0.0;
        for (row, &target) in inputs.outer_iter().zip(targets.iter()) {
            let input = row.to_owned();
            let target = Array1::from_elem(1, target);
            let output = self.forward(&input);
            total_loss += self.loss.calculate(&output, &target);
            self.backward(&input, &output, &target);
        }

        let batch_size = inputs.nrows().max(1) as f32;
        for layer in &mut self.layers {
            layer.scale_grads(1.0 / batch_size);
        }

        self.optimizer.step(&mut self.layers);
        total_loss / batch_size
    }

    /// Trains on `x`/`y`, holding out the trailing `validation_split` share
    /// of rows for validation.
    pub fn fit(
        &mut self,
        x: &Array2<f32>,
        y: &Array1<f32>,
        options: &FitOptions,
        observer: &mut dyn EpochObserver,
    ) -> Result<TrainingHistory> {
        self.check_input(x.view())?;
        if y.len() != x.nrows() {
            return Err(OzoneError::ShapeMismatch { expected: x.nrows(), actual: y.len() });
        }
        if options.epochs == 0 || options.batch_size == 0 {
            return Err(OzoneError::InvalidHyperparameter(
                "epochs and batch size must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&options.validation_split) {
            return Err(OzoneError::InvalidHyperparameter(format!(
                "validation split must be in [0, 1), got {}",
                options.validation_split
            )));
        }

        let n = x.nrows();
        let split_at = (n as f64 * (1.0 - options.validation_split)) as usize;
        if split_at == 0 {
            return Err(OzoneError::InsufficientRows(format!(
                "{} rows leave nothing to train on after the validation split",
                n
            )));
        }
        let (x_train, x_val) = x.view().split_at(Axis(0), split_at);
        let (y_train, y_val) = y.view().split_at(Axis(0), split_at);
        let has_validation = split_at < n;

        debug!(
            train_rows = split_at,
            val_rows = n - split_at,
            epochs = options.epochs,
            batch_size = options.batch_size,
            "fitting model"
        );

        let mut rng = fastrand::Rng::with_seed(options.seed);
        let mut order: Vec<usize> = (0..split_at).collect();
        let mut history = TrainingHistory::default();

        for epoch in 0..options.epochs {
            rng.shuffle(&mut order);
            for chunk in order.chunks(options.batch_size) {
                let inputs = x_train.select(Axis(0), chunk);
                let targets = y_train.select(Axis(0), chunk);
                self.train_batch(inputs.view(), targets.view());
            }

            let train = self.evaluate_view(x_train, y_train);
            if !train.loss.is_finite() {
                return Err(OzoneError::Diverged { epoch, loss: train.loss });
            }
            let validation = has_validation.then(|| self.evaluate_view(x_val, y_val));

            let logs = EpochLogs { train, validation };
            history.record(epoch, &logs);
            observer.on_epoch_end(epoch, &logs);
        }

        observer.on_train_end();
        Ok(history)
    }

    /// Flattened single-output predictions, one per row of `x`.
    pub fn predict(&self, x: &Array2<f32>) -> Result<Array1<f32>> {
        self.check_input(x.view())?;
        Ok(self.predict_view(x.view()))
    }

    pub fn evaluate(&self, x: &Array2<f32>, y: &Array1<f32>) -> Result<EpochMetrics> {
        self.check_input(x.view())?;
        if y.len() != x.nrows() {
            return Err(OzoneError::ShapeMismatch { expected: x.nrows(), actual: y.len() });
        }
        Ok(self.evaluate_view(x.view(), y.view()))
    }

    fn predict_view(&self, x: ArrayView2<f32>) -> Array1<f32> {
        let mut current = x.to_owned();
        for layer in &self.layers {
            current = layer.inference(current.view());
        }
        current.index_axis_move(Axis(1), 0)
    }

    fn evaluate_view(&self, x: ArrayView2<f32>, y: ArrayView1<f32>) -> EpochMetrics {
        let predictions = self.predict_view(x);
        let mse = mean_squared_error(predictions.view(), y);
        EpochMetrics {
            loss: mse,
            mae: mean_absolute_error(predictions.view(), y),
            mse,
        }
    }

    fn check_input(&self, x: ArrayView2<f32>) -> Result<()> {
        if x.ncols() != self.input_size() {
            return Err(OzoneError::ShapeMismatch {
                expected: self.input_size(),
                actual: x.ncols(),
            });
        }
        Ok(())
    }
}
