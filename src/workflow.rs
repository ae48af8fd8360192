//! The end-to-end run: load, split, normalize, train (or search), evaluate,
//! plot, export. Any error ends the run before the export step.

use std::path::PathBuf;

use ndarray::{Array1, Array2};
use tracing::info;

use crate::callbacks::{EpochObserver, LogProgress};
use crate::config::WorkflowConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::export::CompactModel;
use crate::history::TrainingHistory;
use crate::hyperparameters::ModelHyperparameters;
use crate::metrics::{self, EvaluationReport};
use crate::model::Model;
use crate::normalize::Statistics;
use crate::plot::{plot_history, plot_predictions};
use crate::search::{NetworkRegressor, RandomizedSearch, Trainable, TrialResult};

#[derive(Debug)]
pub struct TrainedModel {
    pub model: Model,
    pub hyperparameters: ModelHyperparameters,
    pub history: TrainingHistory,
    /// Search trials; empty for a direct run
    pub trials: Vec<TrialResult>,
}

#[derive(Debug)]
pub struct WorkflowReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub hyperparameters: ModelHyperparameters,
    pub history: TrainingHistory,
    pub trials: Vec<TrialResult>,
    pub test_labels: Array1<f32>,
    pub predictions: Array1<f32>,
    pub evaluation: EvaluationReport,
    pub plots: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub model_bytes: usize,
}

pub fn run(config: &WorkflowConfig) -> Result<WorkflowReport> {
    run_with_observer(config, &mut LogProgress::default())
}

pub fn run_with_observer(config: &WorkflowConfig, observer: &mut dyn EpochObserver) -> Result<WorkflowReport> {
    config.validate()?;

    let dataset = Dataset::from_csv(&config.data_path)?;
    let split = dataset.split(config.train_fraction, config.split_seed)?;
    info!(train = split.train.len(), test = split.test.len(), seed = config.split_seed, "split dataset");

    let train_labels = split.train.column(&config.target)?;
    let test_labels = split.test.column(&config.target)?;

    let stats = Statistics::fit(&split.train)?;
    let x_train = stats.apply(&split.train, &config.features)?;
    let x_test = stats.apply(&split.test, &config.features)?;

    let trained = train(config, &x_train, &train_labels, observer)?;

    let predictions = trained.model.predict(&x_test)?;
    let evaluation = metrics::evaluate(&test_labels, &predictions)?;
    info!(
        r = evaluation.pearson.r,
        p_value = evaluation.pearson.p_value,
        r2 = evaluation.r2,
        mae = evaluation.mae,
        "evaluated on test partition"
    );

    let mut plots = Vec::new();
    if config.plots {
        let dir = &config.plot_dir;
        plots.extend(plot_history(&trained.history, dir)?);
        let scatter = dir.join("predictions.png");
        plot_predictions(&test_labels, &predictions, &scatter)?;
        plots.push(scatter);
    }

    let compact = CompactModel::from_model(&trained.model, &stats, &config.features, &config.target)?;
    let model_bytes = compact.save(&config.output_path)?;

    Ok(WorkflowReport {
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        hyperparameters: trained.hyperparameters,
        history: trained.history,
        trials: trained.trials,
        test_labels,
        predictions,
        evaluation,
        plots,
        output_path: config.output_path.clone(),
        model_bytes,
    })
}

/// Direct fit with the configured hyperparameters when `config.short`,
/// otherwise a randomized search whose winner is refit on all of `x`.
pub fn train(
    config: &WorkflowConfig,
    x: &Array2<f32>,
    y: &Array1<f32>,
    observer: &mut dyn EpochObserver,
) -> Result<TrainedModel> {
    let estimator = NetworkRegressor { fit_options: config.fit_options() };

    if config.short {
        let params = config.hyperparameters;
        info!(neurons = params.neurons, learning_rate = params.learning_rate, "training with fixed hyperparameters");
        let (model, history) = estimator.fit(x, y, &params, observer)?;
        return Ok(TrainedModel { model, hyperparameters: params, history, trials: Vec::new() });
    }

    let search = RandomizedSearch::new(config.search.n_iter, config.search.cv, config.search.seed);
    let result = search.fit(&estimator, &config.search.distributions, x, y, observer)?;
    Ok(TrainedModel {
        model: result.best_estimator,
        hyperparameters: result.best_params,
        history: result.history,
        trials: result.trials,
    })
}
