//! Randomized hyperparameter search with k-fold cross-validation.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::callbacks::EpochObserver;
use crate::error::{OzoneError, Result};
use crate::history::TrainingHistory;
use crate::hyperparameters::{FitOptions, ModelHyperparameters, ParamDistributions};
use crate::model::Model;

/// Anything the search can train from a configuration and then score.
pub trait Trainable {
    type Fitted;

    fn fit(
        &self,
        x: &Array2<f32>,
        y: &Array1<f32>,
        params: &ModelHyperparameters,
        observer: &mut dyn EpochObserver,
    ) -> Result<(Self::Fitted, TrainingHistory)>;

    /// Higher is better.
    fn score(&self, fitted: &Self::Fitted, x: &Array2<f32>, y: &Array1<f32>) -> Result<f64>;
}

/// Adapter that builds and trains a fresh `Model::regressor` per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkRegressor {
    pub fit_options: FitOptions,
}

impl Trainable for NetworkRegressor {
    type Fitted = Model;

    fn fit(
        &self,
        x: &Array2<f32>,
        y: &Array1<f32>,
        params: &ModelHyperparameters,
        observer: &mut dyn EpochObserver,
    ) -> Result<(Model, TrainingHistory)> {
        let mut model = Model::regressor(x.ncols(), params, self.fit_options.seed)?;
        let history = model.fit(x, y, &self.fit_options, observer)?;
        Ok((model, history))
    }

    /// Negative mean squared error.
    fn score(&self, fitted: &Model, x: &Array2<f32>, y: &Array1<f32>) -> Result<f64> {
        let metrics = fitted.evaluate(x, y)?;
        Ok(-(metrics.loss as f64))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Contiguous, unshuffled folds; the first `n % k` folds get one extra row.
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    pub n_splits: usize,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        KFold { n_splits }
    }

    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>> {
        if self.n_splits < 2 {
            return Err(OzoneError::InvalidSearchSpace("n_splits must be at least 2".to_string()));
        }
        if n_samples < self.n_splits {
            return Err(OzoneError::InsufficientRows(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, self.n_splits
            )));
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut current = 0;
        for fold_idx in 0..self.n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let test_indices: Vec<usize> = (current..current + fold_size).collect();
            let train_indices: Vec<usize> = (0..current).chain(current + fold_size..n_samples).collect();
            folds.push(Fold { train_indices, test_indices });
            current += fold_size;
        }
        Ok(folds)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    pub params: ModelHyperparameters,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

#[derive(Debug)]
pub struct SearchResult<F> {
    pub best_params: ModelHyperparameters,
    pub best_score: f64,
    pub trials: Vec<TrialResult>,
    /// Winner refit on all rows
    pub best_estimator: F,
    pub history: TrainingHistory,
}

#[derive(Debug, Clone, Copy)]
pub struct RandomizedSearch {
    pub n_iter: usize,
    pub cv: KFold,
    pub seed: u64,
}

impl RandomizedSearch {
    pub fn new(n_iter: usize, cv: usize, seed: u64) -> Self {
        RandomizedSearch {
            n_iter,
            cv: KFold::new(cv),
            seed,
        }
    }

    pub fn fit<T: Trainable>(
        &self,
        estimator: &T,
        distributions: &ParamDistributions,
        x: &Array2<f32>,
        y: &Array1<f32>,
        observer: &mut dyn EpochObserver,
    ) -> Result<SearchResult<T::Fitted>> {
        if self.n_iter == 0 {
            return Err(OzoneError::InvalidSearchSpace("n_iter must be at least 1".to_string()));
        }
        if y.len() != x.nrows() {
            return Err(OzoneError::ShapeMismatch { expected: x.nrows(), actual: y.len() });
        }
        distributions.validate()?;
        let folds = self.cv.split(x.nrows())?;

        info!(
            candidates = self.n_iter,
            folds = folds.len(),
            fits = self.n_iter * folds.len(),
            "starting randomized search"
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trials: Vec<TrialResult> = Vec::with_capacity(self.n_iter);

        for trial in 0..self.n_iter {
            let params = distributions.sample(&mut rng)?;
            let mut fold_scores = Vec::with_capacity(folds.len());

            for (fold_idx, fold) in folds.iter().enumerate() {
                let x_train = x.select(Axis(0), &fold.train_indices);
                let y_train = y.select(Axis(0), &fold.train_indices);
                let x_test = x.select(Axis(0), &fold.test_indices);
                let y_test = y.select(Axis(0), &fold.test_indices);

                let (fitted, _) = estimator.fit(&x_train, &y_train, &params, observer)?;
                let score = estimator.score(&fitted, &x_test, &y_test)?;
                debug!(trial, fold = fold_idx, ?params, score, "fold scored");
                fold_scores.push(score);
            }

            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            info!(
                trial,
                neurons = params.neurons,
                learning_rate = params.learning_rate,
                alpha = params.alpha,
                mean_score,
                "trial finished"
            );
            trials.push(TrialResult { params, fold_scores, mean_score });
        }

        // NaN scores never win.
        let best = trials
            .iter()
            .filter(|t| !t.mean_score.is_nan())
            .max_by(|a, b| a.mean_score.total_cmp(&b.mean_score))
            .ok_or_else(|| OzoneError::InvalidSearchSpace("every trial scored NaN".to_string()))?;
        let (best_params, best_score) = (best.params, best.mean_score);

        info!(?best_params, best_score, "refitting best candidate on all rows");
        let (best_estimator, history) = estimator.fit(x, y, &best_params, observer)?;

        Ok(SearchResult {
            best_params,
            best_score,
            trials,
            best_estimator,
            history,
        })
    }
}
