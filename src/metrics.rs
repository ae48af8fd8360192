use std::fmt;

use ndarray::Array1;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{OzoneError, Result};
use crate::loss::{mean_absolute_error, mean_squared_error};

/// Pearson correlation with its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pearson {
    pub r: f64,
    pub p_value: f64,
}

impl fmt::Display for Pearson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PearsonRResult(statistic={}, pvalue={})", self.r, self.p_value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    pub n: usize,
    pub pearson: Pearson,
    pub r2: f64,
    pub mae: f64,
    pub mse: f64,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.pearson)?;
        write!(f, "{}", self.r2)
    }
}

fn check_lengths(y_true: &Array1<f32>, y_pred: &Array1<f32>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(OzoneError::ShapeMismatch { expected: y_true.len(), actual: y_pred.len() });
    }
    Ok(())
}

/// Pearson r between two sequences. Either sequence being constant makes
/// r (and its p-value) undefined, reported as NaN.
pub fn pearson(x: &Array1<f32>, y: &Array1<f32>) -> Result<Pearson> {
    check_lengths(x, y)?;
    let n = x.len();
    if n < 2 {
        return Err(OzoneError::InsufficientRows(format!(
            "correlation needs at least 2 points, got {}",
            n
        )));
    }

    let mean_x = x.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let mean_y = y.iter().map(|&v| v as f64).sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0f64, 0.0f64, 0.0f64);
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a as f64 - mean_x;
        let dy = b as f64 - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Ok(Pearson { r: f64::NAN, p_value: f64::NAN });
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let p_value = pearson_p_value(r, n)?;
    Ok(Pearson { r, p_value })
}

fn pearson_p_value(r: f64, n: usize) -> Result<f64> {
    if n == 2 {
        return Ok(1.0);
    }
    if r.abs() >= 1.0 {
        return Ok(0.0);
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| OzoneError::Statistics(e.to_string()))?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Coefficient of determination. A constant `y_true` scores 1.0 when the
/// predictions match it exactly and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f32>, y_pred: &Array1<f32>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    if y_true.is_empty() {
        return Err(OzoneError::InsufficientRows("R² needs at least 1 point".to_string()));
    }

    let mean = y_true.iter().map(|&v| v as f64).sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|&v| (v as f64 - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (t as f64 - p as f64).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

pub fn evaluate(y_true: &Array1<f32>, y_pred: &Array1<f32>) -> Result<EvaluationReport> {
    let pearson = pearson(y_true, y_pred)?;
    let r2 = r2_score(y_true, y_pred)?;

    Ok(EvaluationReport {
        n: y_true.len(),
        pearson,
        r2,
        mae: mean_absolute_error(y_pred.view(), y_true.view()) as f64,
        mse: mean_squared_error(y_pred.view(), y_true.view()) as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let truth = array![10.0, 20.0, 30.0];
        let report = evaluate(&truth, &truth.clone()).unwrap();

        assert!((report.r2 - 1.0).abs() < 1e-12);
        assert!((report.pearson.r - 1.0).abs() < 1e-12);
        assert_eq!(report.pearson.p_value, 0.0);
        assert_eq!(report.mae, 0.0);
    }

    #[test]
    fn test_constant_predictor() {
        let truth = array![10.0, 20.0, 30.0];
        let constant = array![15.0, 15.0, 15.0];

        let r2 = r2_score(&truth, &constant).unwrap();
        assert!(r2 <= 0.0);
        assert!((r2 - (1.0 - 275.0 / 200.0)).abs() < 1e-12);

        let p = pearson(&truth, &constant).unwrap();
        assert!(p.r.is_nan());
        assert!(p.p_value.is_nan());
    }

    #[test]
    fn test_anticorrelated() {
        let p = pearson(&array![1.0, 2.0, 3.0, 4.0], &array![8.0, 6.0, 4.0, 2.0]).unwrap();
        assert!((p.r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_p_value_against_known_value() {
        // r = 0.8 with n = 10: t = 3.771, two-sided p ≈ 0.00546
        let p = pearson_p_value(0.8, 10).unwrap();
        assert!((p - 0.005_46).abs() < 5e-4);
    }

    #[test]
    fn test_r2_constant_truth() {
        let truth = array![4.0, 4.0];
        assert_eq!(r2_score(&truth, &array![4.0, 4.0]).unwrap(), 1.0);
        assert_eq!(r2_score(&truth, &array![3.0, 4.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            r2_score(&array![1.0, 2.0], &array![1.0]),
            Err(OzoneError::ShapeMismatch { .. })
        ));
        assert!(pearson(&array![1.0], &array![1.0]).is_err());
    }

    #[test]
    fn test_report_display() {
        let truth = array![10.0, 20.0, 30.0];
        let text = evaluate(&truth, &truth.clone()).unwrap().to_string();
        assert!(text.starts_with("PearsonRResult(statistic=1, pvalue=0)"));
        assert!(text.ends_with('1'));
    }
}
