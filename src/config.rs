use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{OzoneError, Result};
use crate::hyperparameters::{FitOptions, ModelHyperparameters, ParamDistributions};

/// Everything a training run needs. Missing keys in a config file fall back
/// to these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Input CSV
    pub data_path: PathBuf,
    /// Label column, the reading one step ahead
    pub target: String,
    /// Model inputs, in the order the network sees them
    pub features: Vec<String>,
    /// Where the exported model is written (overwritten if present)
    pub output_path: PathBuf,
    /// Render the diagnostic charts into `plot_dir`
    pub plots: bool,
    pub plot_dir: PathBuf,

    pub train_fraction: f64,
    pub split_seed: u64,

    pub epochs: usize,
    pub batch_size: usize,
    pub validation_split: f64,
    pub seed: u64,

    /// Train the default network directly instead of searching
    pub short: bool,
    pub hyperparameters: ModelHyperparameters,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub n_iter: usize,
    pub cv: usize,
    pub seed: u64,
    pub distributions: ParamDistributions,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            n_iter: 1,
            cv: 3,
            seed: 0,
            distributions: ParamDistributions::default(),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let fit = FitOptions::default();
        WorkflowConfig {
            data_path: PathBuf::from("./SanBasilio_Lite.csv"),
            target: "O3_t1".to_string(),
            features: ["PM10", "PM2.5", "NO2", "SO2", "O3", "CO"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_path: PathBuf::from("./O3_predictor.ozm"),
            plots: true,
            plot_dir: PathBuf::from("./plots"),
            train_fraction: 0.8,
            split_seed: 0,
            epochs: fit.epochs,
            batch_size: fit.batch_size,
            validation_split: fit.validation_split,
            seed: fit.seed,
            short: true,
            hyperparameters: ModelHyperparameters::default(),
            search: SearchConfig::default(),
        }
    }
}

impl WorkflowConfig {
    /// Reads a TOML file; keys it leaves out keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .build()?;

        let config: WorkflowConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(OzoneError::InvalidHyperparameter(msg));

        if self.features.is_empty() {
            return invalid("at least one feature column is required".to_string());
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return invalid(format!("train_fraction must be in (0, 1), got {}", self.train_fraction));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return invalid(format!("validation_split must be in [0, 1), got {}", self.validation_split));
        }
        if self.epochs == 0 || self.batch_size == 0 {
            return invalid("epochs and batch_size must be positive".to_string());
        }
        if self.short {
            self.hyperparameters.validate()?;
        } else {
            if self.search.n_iter == 0 {
                return Err(OzoneError::InvalidSearchSpace("n_iter must be at least 1".to_string()));
            }
            if self.search.cv < 2 {
                return Err(OzoneError::InvalidSearchSpace("cv must be at least 2".to_string()));
            }
            self.search.distributions.validate()?;
        }
        Ok(())
    }

    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            epochs: self.epochs,
            batch_size: self.batch_size,
            validation_split: self.validation_split,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = WorkflowConfig::default();

        assert!(config.short);
        assert!(config.plots);
        assert_eq!(config.plot_dir, PathBuf::from("./plots"));
        assert_eq!(config.target, "O3_t1");
        assert_eq!(config.features.len(), 6);
        assert_eq!(config.epochs, 1000);
        assert_eq!(config.search.n_iter, 1);
        assert_eq!(config.search.cv, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_overrides_only_given_keys() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "epochs = 5\nshort = false\nplots = false\n\n[search]\nn_iter = 4").unwrap();
        file.flush().unwrap();

        let config = WorkflowConfig::load(file.path()).unwrap();
        assert_eq!(config.epochs, 5);
        assert!(!config.short);
        assert!(!config.plots);
        assert_eq!(config.search.n_iter, 4);
        assert_eq!(config.search.cv, 3);
        assert_eq!(config.target, "O3_t1");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = WorkflowConfig { train_fraction: 1.0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = WorkflowConfig { epochs: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let mut config = WorkflowConfig { short: false, ..Default::default() };
        config.search.cv = 1;
        assert!(matches!(config.validate(), Err(OzoneError::InvalidSearchSpace(_))));
    }
}
