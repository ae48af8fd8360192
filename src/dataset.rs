//! Tabular data loading and the seeded train/test split.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

use crate::error::{OzoneError, Result};

/// Cell spellings treated as missing in sensor exports.
const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Numeric table with named columns. Each row remembers its position in the
/// source file so partitions can be compared after a split.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    values: Array2<f32>,
    row_ids: Vec<usize>,
}

/// Disjoint partitions of one dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

impl Dataset {
    pub fn new(columns: Vec<String>, values: Array2<f32>, row_ids: Vec<usize>) -> Result<Self> {
        if values.ncols() != columns.len() {
            return Err(OzoneError::ShapeMismatch { expected: columns.len(), actual: values.ncols() });
        }
        if values.nrows() != row_ids.len() {
            return Err(OzoneError::ShapeMismatch { expected: row_ids.len(), actual: values.nrows() });
        }
        Ok(Dataset { columns, values, row_ids })
    }

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            columns = dataset.columns.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Reads a headed CSV, drops every row with a missing cell, then keeps
    /// the columns whose remaining cells all parse as numbers.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut complete: Vec<(usize, StringRecord)> = Vec::new();
        let mut dropped = 0usize;
        for (row_id, result) in rdr.records().enumerate() {
            let record = result?;
            if record.iter().any(|cell| MISSING_MARKERS.contains(&cell)) {
                dropped += 1;
                continue;
            }
            complete.push((row_id, record));
        }
        debug!(kept = complete.len(), dropped, "dropped incomplete rows");

        if complete.is_empty() {
            return Err(OzoneError::EmptyDataset);
        }

        let numeric: Vec<usize> = (0..headers.len())
            .filter(|&col| complete.iter().all(|(_, record)| record[col].parse::<f32>().is_ok()))
            .collect();
        if numeric.len() < headers.len() {
            let skipped: Vec<&str> = (0..headers.len())
                .filter(|col| !numeric.contains(col))
                .map(|col| headers[col].as_str())
                .collect();
            debug!(?skipped, "ignoring non-numeric columns");
        }

        let mut values = Array2::<f32>::zeros((complete.len(), numeric.len()));
        for (row, (_, record)) in complete.iter().enumerate() {
            for (out_col, &col) in numeric.iter().enumerate() {
                // Parsed successfully in the filter above.
                values[[row, out_col]] = record[col].parse().unwrap_or(f32::NAN);
            }
        }

        let columns = numeric.iter().map(|&col| headers[col].clone()).collect();
        let row_ids = complete.iter().map(|(row_id, _)| *row_id).collect();
        Self::new(columns, values, row_ids)
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| OzoneError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<Array1<f32>> {
        let idx = self.column_index(name)?;
        Ok(self.values.column(idx).to_owned())
    }

    /// Columns `names`, in that order.
    pub fn features<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<f32>> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.values.select(Axis(1), &indices))
    }

    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
            row_ids: indices.iter().map(|&i| self.row_ids[i]).collect(),
        }
    }

    /// Random `train_fraction` share of rows (in sampled order) for training,
    /// the rest (in file order) for testing. The same seed always yields the
    /// same partitions.
    pub fn split(&self, train_fraction: f64, seed: u64) -> Result<Split> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(OzoneError::InsufficientRows(format!(
                "train fraction must be strictly between 0 and 1, got {}",
                train_fraction
            )));
        }

        let n = self.len();
        let n_train = (n as f64 * train_fraction).round() as usize;
        if n_train == 0 || n_train == n {
            return Err(OzoneError::InsufficientRows(format!(
                "{} rows cannot be split {:.0}/{:.0}",
                n,
                train_fraction * 100.0,
                (1.0 - train_fraction) * 100.0
            )));
        }

        let mut rng = fastrand::Rng::with_seed(seed);
        let mut order: Vec<usize> = (0..n).collect();
        rng.shuffle(&mut order);

        let train_idx = &order[..n_train];
        let mut test_idx = order[n_train..].to_vec();
        test_idx.sort_unstable();

        Ok(Split {
            train: self.select_rows(train_idx),
            test: self.select_rows(&test_idx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
date,PM10,NO2,O3_t1
2020-01-01,10,20,30
2020-01-02,,21,31
2020-01-03,12,NA,32
2020-01-04,13,23,33
";

    #[test]
    fn test_drops_incomplete_rows() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.row_ids(), &[0, 3]);
        assert_eq!(dataset.column("PM10").unwrap().to_vec(), vec![10.0, 13.0]);
    }

    #[test]
    fn test_skips_non_numeric_columns() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(dataset.columns(), &["PM10", "NO2", "O3_t1"]);
        assert!(matches!(dataset.column("date"), Err(OzoneError::MissingColumn(_))));
    }

    #[test]
    fn test_features_follow_requested_order() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        let x = dataset.features(&["NO2", "PM10"]).unwrap();

        assert_eq!(x.row(0).to_vec(), vec![20.0, 10.0]);
        assert!(dataset.features(&["SO2"]).is_err());
    }

    #[test]
    fn test_all_rows_incomplete_is_empty() {
        let csv = "a,b\n1,\n,2\n";
        assert!(matches!(Dataset::from_reader(csv.as_bytes()), Err(OzoneError::EmptyDataset)));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let csv = "a,b\n1,2\n3\n";
        assert!(matches!(Dataset::from_reader(csv.as_bytes()), Err(OzoneError::Csv(_))));
    }

    #[test]
    fn test_split_sizes() {
        let values = Array2::from_shape_fn((10, 2), |(r, c)| (r * 2 + c) as f32);
        let dataset = Dataset::new(vec!["a".into(), "b".into()], values, (0..10).collect()).unwrap();

        let split = dataset.split(0.8, 0).unwrap();
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.test.len(), 2);
        assert!(split.test.row_ids().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_split_rejects_degenerate_fraction() {
        let dataset = Dataset::new(vec!["a".into()], Array2::zeros((3, 1)), vec![0, 1, 2]).unwrap();
        assert!(dataset.split(1.0, 0).is_err());
        assert!(dataset.split(0.1, 0).is_err());
    }
}
