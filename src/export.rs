//! Compact on-device model format.
//!
//! The file is a bincode-encoded [`CompactModel`]: a magic tag and format
//! version, the feature order and the training statistics needed to scale
//! raw readings, then each dense layer's weights and bias, row-major.

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::activation::ActivationType;
use crate::error::{OzoneError, Result};
use crate::layers::{FeedForwardLayer, Layer};
use crate::model::Model;
use crate::normalize::{standardize, Statistics};
use crate::{Loss, Optimizer};

pub const MAGIC: [u8; 4] = *b"OZM1";
pub const FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactLayer {
    pub inputs: u32,
    pub neurons: u32,
    pub activation: ActivationType,
    /// `neurons × inputs`, row-major
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactModel {
    magic: [u8; 4],
    version: u16,
    pub features: Vec<String>,
    pub target: String,
    pub means: Vec<f32>,
    pub scales: Vec<f32>,
    pub layers: Vec<CompactLayer>,
}

impl CompactModel {
    pub fn from_model<S: AsRef<str>>(
        model: &Model,
        stats: &Statistics,
        features: &[S],
        target: &str,
    ) -> Result<Self> {
        if features.len() != model.input_size() {
            return Err(OzoneError::ShapeMismatch { expected: model.input_size(), actual: features.len() });
        }
        let (means, scales) = stats.select(features)?;

        let layers = model
            .layers
            .iter()
            .map(|layer| {
                let p = layer.params();
                CompactLayer {
                    inputs: p.inputs as u32,
                    neurons: p.neurons as u32,
                    activation: p.activation,
                    weights: p.weights.iter().copied().collect(),
                    bias: p.bias.to_vec(),
                }
            })
            .collect();

        Ok(CompactModel {
            magic: MAGIC,
            version: FORMAT_VERSION,
            features: features.iter().map(|f| f.as_ref().to_string()).collect(),
            target: target.to_string(),
            means,
            scales,
            layers,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: CompactModel = bincode::deserialize(bytes)
            .map_err(|e| OzoneError::InvalidModelFile(e.to_string()))?;
        if model.magic != MAGIC {
            return Err(OzoneError::InvalidModelFile("bad magic".to_string()));
        }
        if model.version != FORMAT_VERSION {
            return Err(OzoneError::InvalidModelFile(format!(
                "unsupported format version {}",
                model.version
            )));
        }
        Ok(model)
    }

    /// Serializes fully before touching the filesystem, then replaces any
    /// existing file in one write. Returns the number of bytes written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "exported model");
        Ok(bytes.len())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Rebuilds an inference-ready network from the stored layers.
    pub fn to_model(&self) -> Result<Model> {
        let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let shape = (layer.neurons as usize, layer.inputs as usize);
            let weights = Array2::from_shape_vec(shape, layer.weights.clone())
                .map_err(|e| OzoneError::InvalidModelFile(e.to_string()))?;
            if layer.bias.len() != shape.0 {
                return Err(OzoneError::InvalidModelFile(format!(
                    "bias has {} entries for {} neurons",
                    layer.bias.len(),
                    shape.0
                )));
            }
            let bias = Array1::from_vec(layer.bias.clone());
            layers.push(Box::new(FeedForwardLayer::from_weights(weights, bias, layer.activation)));
        }
        // The optimizer is never stepped at inference time.
        Model::from_layers(layers, Loss::MeanSquaredError, Optimizer::new(0.0))
    }

    /// Scales raw readings (columns in `features` order) and predicts.
    pub fn predict_raw(&self, raw: &Array2<f32>) -> Result<Array1<f32>> {
        if raw.ncols() != self.features.len() {
            return Err(OzoneError::ShapeMismatch { expected: self.features.len(), actual: raw.ncols() });
        }
        let normed = standardize(raw.clone(), &self.means, &self.scales);
        self.to_model()?.predict(&normed)
    }
}
