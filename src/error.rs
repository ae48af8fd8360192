use thiserror::Error;

/// Every way a training run can fail. None of these are recovered from:
/// the workflow stops at the first one.
#[derive(Error, Debug)]
pub enum OzoneError {
    // I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Plot rendering failed: {0}")]
    Plot(String),

    #[error("Invalid model file: {0}")]
    InvalidModelFile(String),

    // Data
    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Dataset is empty after dropping incomplete rows")]
    EmptyDataset,

    #[error("Not enough rows: {0}")]
    InsufficientRows(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Statistics error: {0}")]
    Statistics(String),

    // Training
    #[error("Training diverged at epoch {epoch}: loss is {loss}")]
    Diverged { epoch: usize, loss: f32 },

    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    // Search
    #[error("Invalid search space: {0}")]
    InvalidSearchSpace(String),
}

pub type Result<T> = std::result::Result<T, OzoneError>;
