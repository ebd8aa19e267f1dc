use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array1<f64>,
    pub x_test: Array1<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Number of samples that go to the test partition: `ceil(test_size * n)`.
pub fn test_count(n: usize, test_size: f64) -> usize {
    (test_size * n as f64).ceil() as usize
}

/// Shuffled train/test split. The same `seed` always yields the same partition.
pub fn split(
    x: &Array1<f64>,
    y: &Array1<f64>,
    test_size: f64,
    seed: Option<u64>,
) -> Result<Split> {
    if x.len() != y.len() {
        return Err(Error::InvalidInput(format!(
            "feature and target lengths differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }

    if !(test_size > 0. && test_size < 1.) {
        return Err(Error::InvalidConfig(format!(
            "test_size must lie in (0, 1), got {test_size}"
        )));
    }

    let n = x.len();
    let n_test = test_count(n, test_size);

    if n_test == 0 || n_test >= n {
        return Err(Error::InvalidInput(format!(
            "cannot split {n} samples with test_size {test_size}"
        )));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok(Split {
        x_train: x.select(ndarray::Axis(0), train_idx),
        x_test: x.select(ndarray::Axis(0), test_idx),
        y_train: y.select(ndarray::Axis(0), train_idx),
        y_test: y.select(ndarray::Axis(0), test_idx),
    })
}

/// Standard score scaling with statistics taken from the training data only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardizer {
    pub mean: f64,
    pub std: f64,
}

impl Standardizer {
    pub fn fit(values: &Array1<f64>) -> Result<Self> {
        let mean = values
            .mean()
            .ok_or_else(|| Error::InvalidInput("cannot standardize an empty column".to_string()))?;

        let std = values.std(0.);
        let std = if std == 0. { 1. } else { std };

        Ok(Self { mean, std })
    }

    pub fn transform(&self, values: &Array1<f64>) -> Array1<f64> {
        values.mapv(|v| (v - self.mean) / self.std)
    }
}

pub fn normalize(
    x_train: &Array1<f64>,
    x_test: &Array1<f64>,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let scaler = Standardizer::fit(x_train)?;

    Ok((scaler.transform(x_train), scaler.transform(x_test)))
}
