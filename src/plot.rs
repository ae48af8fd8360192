use std::error::Error;
use std::path::{Path, PathBuf};

use ndarray::Array1;
use plotters::prelude::*;
use tracing::info;

use crate::error::{OzoneError, Result};
use crate::history::{EpochMetrics, TrainingHistory};

type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Renders `mae.png` and `mse.png` (train vs. validation per epoch) into `dir`.
pub fn plot_history(history: &TrainingHistory, dir: &Path) -> Result<Vec<PathBuf>> {
    if history.is_empty() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(dir)?;

    let charts: [(&str, &str, fn(&EpochMetrics) -> f32); 2] = [
        ("mae.png", "Mean Abs Error [O3]", mae_of),
        ("mse.png", "Mean Square Error [O3^2]", mse_of),
    ];

    let mut written = Vec::with_capacity(charts.len());
    for (file, y_desc, metric) in charts {
        let path = dir.join(file);
        draw_error_curves(history, &path, y_desc, metric).map_err(|e| OzoneError::Plot(e.to_string()))?;
        info!(path = %path.display(), "wrote training curve");
        written.push(path);
    }
    Ok(written)
}

fn mae_of(m: &EpochMetrics) -> f32 {
    m.mae
}

fn mse_of(m: &EpochMetrics) -> f32 {
    m.mse
}

fn draw_error_curves(
    history: &TrainingHistory,
    path: &Path,
    y_desc: &str,
    metric: fn(&EpochMetrics) -> f32,
) -> DrawResult {
    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let train: Vec<(f32, f32)> = history.epochs.iter().zip(history.train.iter())
        .map(|(&e, m)| (e as f32, metric(m)))
        .collect();
    let val: Vec<(f32, f32)> = history.epochs.iter().zip(history.validation.iter())
        .map(|(&e, m)| (e as f32, metric(m)))
        .collect();

    let max_epoch = history.epochs.last().map_or(1.0, |&e| e.max(1) as f32);
    let max_y = train.iter().chain(val.iter())
        .map(|&(_, y)| y)
        .filter(|y| y.is_finite())
        .fold(0.0f32, f32::max)
        .max(f32::EPSILON);

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f32..max_epoch, 0f32..max_y * 1.05)?;

    chart.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("Epoch")
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(LineSeries::new(train, &BLUE))?
        .label("Train Error")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    if !val.is_empty() {
        chart.draw_series(LineSeries::new(val, &RED))?
            .label("Val Error")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    }

    chart.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// True vs. predicted scatter.
pub fn plot_predictions(y_true: &Array1<f32>, y_pred: &Array1<f32>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    draw_scatter(y_true, y_pred, path).map_err(|e| OzoneError::Plot(e.to_string()))?;
    info!(path = %path.display(), "wrote prediction scatter");
    Ok(())
}

fn draw_scatter(y_true: &Array1<f32>, y_pred: &Array1<f32>, path: &Path) -> DrawResult {
    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let finite = |v: &&f32| v.is_finite();
    let lo = y_true.iter().chain(y_pred.iter()).filter(finite).copied().fold(f32::INFINITY, f32::min);
    let hi = y_true.iter().chain(y_pred.iter()).filter(finite).copied().fold(f32::NEG_INFINITY, f32::max);
    let (lo, hi) = if lo < hi { (lo, hi) } else { (lo.min(0.0) - 1.0, hi.max(0.0) + 1.0) };

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..hi, lo..hi)?;

    chart.configure_mesh()
        .x_desc("True Values")
        .y_desc("Predictions")
        .draw()?;

    chart.draw_series(
        y_true.iter().zip(y_pred.iter())
            .map(|(&t, &p)| Circle::new((t, p), 3, BLUE.filled())),
    )?;

    // Identity line for reference
    chart.draw_series(LineSeries::new(vec![(lo, lo), (hi, hi)], &BLACK))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::EpochLogs;
    use ndarray::array;

    #[test]
    fn test_empty_history_draws_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("charts");

        let written = plot_history(&TrainingHistory::default(), &target).unwrap();
        assert!(written.is_empty());
        assert!(!target.exists());
    }

    #[test]
    fn test_renders_curves_and_scatter() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = TrainingHistory::default();
        for epoch in 0..5 {
            let m = EpochMetrics { loss: 5.0 - epoch as f32, mae: 2.0 / (epoch + 1) as f32, mse: 5.0 - epoch as f32 };
            history.record(epoch, &EpochLogs { train: m, validation: Some(m) });
        }

        let mut written = plot_history(&history, dir.path()).unwrap();
        let scatter = dir.path().join("predictions.png");
        plot_predictions(&array![10.0, 20.0, 30.0], &array![12.0, 18.0, 33.0], &scatter).unwrap();
        written.push(scatter);

        assert_eq!(written.len(), 3);
        for path in written {
            assert!(std::fs::metadata(&path).unwrap().len() > 0, "{} is empty", path.display());
        }
    }
}
