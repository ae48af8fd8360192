mod activation;
mod loss;
mod model;
mod optimizer;

pub mod callbacks;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod history;
pub mod hyperparameters;
pub mod layers;
pub mod metrics;
pub mod normalize;
pub mod plot;
pub mod search;
pub mod workflow;

pub use model::Model;
pub use model::LayerConfig;
pub use layers::{FeedForwardLayer, Layer};
pub use activation::ActivationType;
pub use loss::Loss;
pub use optimizer::Optimizer;

pub use config::WorkflowConfig;
pub use dataset::{Dataset, Split};
pub use error::{OzoneError, Result};
pub use hyperparameters::{FitOptions, ModelHyperparameters, ParamDistributions};
pub use normalize::Statistics;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Major.minor of the `ndarray` release the numerics are built on; keep in
/// step with Cargo.toml.
pub const NDARRAY_VERSION: &str = "0.16";

/// Startup line: this crate's version and the numerical backend's.
pub fn banner() -> String {
    format!("ozone {} (ndarray {})", VERSION, NDARRAY_VERSION)
}
