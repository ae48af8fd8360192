use ndarray::{Array1, Array2, Axis};
use tracing::warn;

use crate::dataset::Dataset;
use crate::error::{OzoneError, Result};

/// Per-column mean and sample standard deviation of a training partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub columns: Vec<String>,
    pub mean: Array1<f32>,
    pub std: Array1<f32>,
}

impl Statistics {
    /// Fits on every column of `train`. Only ever call this with the
    /// training partition; test rows are scaled with the result.
    pub fn fit(train: &Dataset) -> Result<Self> {
        if train.len() < 2 {
            return Err(OzoneError::InsufficientRows(format!(
                "standard deviation needs at least 2 rows, got {}",
                train.len()
            )));
        }

        let values = train.values();
        let mean = values.mean_axis(Axis(0)).ok_or(OzoneError::EmptyDataset)?;
        let std = values.std_axis(Axis(0), 1.0);

        for (name, &s) in train.columns().iter().zip(std.iter()) {
            if !s.is_finite() {
                return Err(OzoneError::Statistics(format!("column {} has a non-finite spread", name)));
            }
            if s == 0.0 {
                warn!(column = %name, "zero variance, values will only be centred");
            }
        }

        Ok(Statistics {
            columns: train.columns().to_vec(),
            mean,
            std,
        })
    }

    /// Divisor used for a column: its standard deviation, or 1 when that is zero.
    pub fn scale(&self, idx: usize) -> f32 {
        let s = self.std[idx];
        if s == 0.0 { 1.0 } else { s }
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| OzoneError::MissingColumn(name.to_string()))
    }

    /// Means and scales for `columns`, in that order.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<(Vec<f32>, Vec<f32>)> {
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());
        for name in columns {
            let idx = self.index_of(name.as_ref())?;
            means.push(self.mean[idx]);
            scales.push(self.scale(idx));
        }
        Ok((means, scales))
    }

    /// `(value - mean) / std` for the requested columns of `dataset`.
    pub fn apply<S: AsRef<str>>(&self, dataset: &Dataset, columns: &[S]) -> Result<Array2<f32>> {
        let raw = dataset.features(columns)?;
        let (means, scales) = self.select(columns)?;
        Ok(standardize(raw, &means, &scales))
    }

    /// Inverse of `apply` for a matrix whose columns are `columns`.
    pub fn denormalize<S: AsRef<str>>(&self, normalized: &Array2<f32>, columns: &[S]) -> Result<Array2<f32>> {
        if normalized.ncols() != columns.len() {
            return Err(OzoneError::ShapeMismatch { expected: columns.len(), actual: normalized.ncols() });
        }
        let (means, scales) = self.select(columns)?;
        let mut out = normalized.clone();
        for (mut col, (m, s)) in out.axis_iter_mut(Axis(1)).zip(means.iter().zip(scales.iter())) {
            col.mapv_inplace(|v| v * s + m);
        }
        Ok(out)
    }
}

/// Column-wise `(value - mean) / scale`.
pub fn standardize(mut raw: Array2<f32>, means: &[f32], scales: &[f32]) -> Array2<f32> {
    for (mut col, (m, s)) in raw.axis_iter_mut(Axis(1)).zip(means.iter().zip(scales.iter())) {
        col.mapv_inplace(|v| (v - m) / s);
    }
    raw
}
