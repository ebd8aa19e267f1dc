use ndarray::Array1;
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

fn check_pair(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::InvalidInput(format!(
            "true and predicted lengths differ: {} vs {}",
            y_true.len(),
            y_pred.len()
        )));
    }

    if y_true.is_empty() {
        return Err(Error::InvalidInput("nothing to evaluate".to_string()));
    }

    Ok(())
}

fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    (y_true - y_pred).mapv(|e| e * e).sum() / y_true.len() as f64
}

pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true, y_pred)?;

    Ok(mean_squared_error(y_true, y_pred).sqrt())
}

pub fn mae(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true, y_pred)?;

    Ok((y_true - y_pred).mapv(f64::abs).sum() / y_true.len() as f64)
}

/// Coefficient of determination. A constant target scores 1 when predicted
/// exactly and 0 otherwise.
pub fn r2(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true, y_pred)?;

    let mean = y_true.sum() / y_true.len() as f64;

    let ss_res = (y_true - y_pred).mapv(|e| e * e).sum();
    let ss_tot = y_true.mapv(|y| (y - mean).powi(2)).sum();

    if ss_tot == 0. {
        return Ok(if ss_res == 0. { 1. } else { 0. });
    }

    Ok(1. - ss_res / ss_tot)
}

pub fn metrics(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Metrics> {
    Ok(Metrics {
        rmse: rmse(y_true, y_pred)?,
        mae: mae(y_true, y_pred)?,
        r2: r2(y_true, y_pred)?,
    })
}
