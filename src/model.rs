use log::debug;
use nalgebra::{DMatrix, DVector};
use ndarray::Array1;

use crate::error::{Error, Result};

/// Slope and intercept of `y = weight * x + bias`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub weight: f64,
    pub bias: f64,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.weight * x + self.bias
    }

    pub fn predict_all(&self, x: &Array1<f64>) -> Array1<f64> {
        x.mapv(|x| self.predict(x))
    }

    /// Mean squared error of this line over `(x, y)`. Assumes equal, non-zero lengths.
    pub fn mse(&self, x: &[f64], y: &[f64]) -> f64 {
        let sum: f64 = x
            .iter()
            .zip(y)
            .map(|(&x, &y)| (self.predict(x) - y).powi(2))
            .sum();

        sum / x.len() as f64
    }

    pub fn is_finite(&self) -> bool {
        self.weight.is_finite() && self.bias.is_finite()
    }
}

fn check_samples(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(Error::InvalidInput(format!(
            "feature and target lengths differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }

    if x.is_empty() {
        return Err(Error::InvalidInput("empty sample set".to_string()));
    }

    Ok(())
}

fn check_learning_rate(learning_rate: f64) -> Result<()> {
    if !learning_rate.is_finite() || learning_rate <= 0. {
        return Err(Error::InvalidHyperparameter(format!(
            "learning rate must be positive and finite, got {learning_rate}"
        )));
    }

    Ok(())
}

fn check_iterations(iterations: i64) -> Result<usize> {
    usize::try_from(iterations).map_err(|_| {
        Error::InvalidHyperparameter(format!(
            "iterations must be non-negative, got {iterations}"
        ))
    })
}

pub fn check_hyperparameters(learning_rate: f64, iterations: i64) -> Result<usize> {
    check_learning_rate(learning_rate)?;
    check_iterations(iterations)
}

/// Unguarded batch gradient descent on mean squared error.
///
/// Every call to `next` applies one full-batch update and yields the
/// parameters after it. The iterator never ends and never checks for
/// divergence, so callers bound it with `take`.
pub struct GradientDescent<'a> {
    x: &'a [f64],
    y: &'a [f64],
    learning_rate: f64,
    fit: LineFit,
}

impl<'a> GradientDescent<'a> {
    pub fn new(x: &'a [f64], y: &'a [f64], learning_rate: f64) -> Result<Self> {
        check_samples(x, y)?;
        check_learning_rate(learning_rate)?;

        Ok(Self {
            x,
            y,
            learning_rate,
            fit: LineFit::default(),
        })
    }

    pub fn fit(&self) -> LineFit {
        self.fit
    }

    fn step(&mut self) -> LineFit {
        let n = self.x.len() as f64;

        let mut weight_sum = 0.;
        let mut bias_sum = 0.;

        for i in 0..self.x.len() {
            let error = self.fit.predict(self.x[i]) - self.y[i];
            weight_sum += error * self.x[i];
            bias_sum += error;
        }

        let dw = 2. / n * weight_sum;
        let db = 2. / n * bias_sum;

        self.fit.weight -= self.learning_rate * dw;
        self.fit.bias -= self.learning_rate * db;

        self.fit
    }
}

impl Iterator for GradientDescent<'_> {
    type Item = LineFit;

    fn next(&mut self) -> Option<LineFit> {
        Some(self.step())
    }
}

/// Fits `y = w * x + b` with `iterations` steps of batch gradient descent
/// starting from `(0, 0)`.
///
/// Fails with [`Error::NumericDivergence`] as soon as an update produces a
/// non-finite parameter; use [`GradientDescent`] directly to observe the raw
/// trajectory instead.
pub fn train_scratch(
    x: &[f64],
    y: &[f64],
    learning_rate: f64,
    iterations: i64,
) -> Result<LineFit> {
    descend(x, y, learning_rate, iterations, |_| {})
}

/// Same as [`train_scratch`], also returning the training loss after every update.
pub fn train_scratch_with_losses(
    x: &[f64],
    y: &[f64],
    learning_rate: f64,
    iterations: i64,
) -> Result<(LineFit, Vec<f64>)> {
    let mut losses = Vec::new();
    let fit = descend(x, y, learning_rate, iterations, |fit| {
        losses.push(fit.mse(x, y))
    })?;

    Ok((fit, losses))
}

fn descend(
    x: &[f64],
    y: &[f64],
    learning_rate: f64,
    iterations: i64,
    mut on_step: impl FnMut(&LineFit),
) -> Result<LineFit> {
    let mut descent = GradientDescent::new(x, y, learning_rate)?;
    let iterations = check_iterations(iterations)?;

    for (i, fit) in descent.by_ref().take(iterations).enumerate() {
        if !fit.is_finite() {
            return Err(Error::NumericDivergence {
                iteration: i + 1,
                weight: fit.weight,
                bias: fit.bias,
            });
        }
        on_step(&fit);
    }

    let fit = descent.fit();
    debug!(
        "scratch fit after {iterations} iterations: w = {}, b = {}",
        fit.weight, fit.bias
    );

    Ok(fit)
}

/// Closed-form least squares with an intercept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrdinaryLeastSquares {
    line: LineFit,
}

impl OrdinaryLeastSquares {
    pub fn fit(x: &Array1<f64>, y: &Array1<f64>) -> Result<Self> {
        let (Some(x_mean), Some(y_mean)) = (x.mean(), y.mean()) else {
            return Err(Error::InvalidInput("empty sample set".to_string()));
        };

        if x.len() != y.len() {
            return Err(Error::InvalidInput(format!(
                "feature and target lengths differ: {} vs {}",
                x.len(),
                y.len()
            )));
        }

        let design = DMatrix::from_iterator(x.len(), 1, x.iter().map(|x| x - x_mean));
        let target = DVector::from_iterator(y.len(), y.iter().map(|y| y - y_mean));

        let coefficients = normal_equations(design, target)?;
        let weight = coefficients[0];

        Ok(Self {
            line: LineFit {
                weight,
                bias: y_mean - weight * x_mean,
            },
        })
    }

    pub fn coefficient(&self) -> f64 {
        self.line.weight
    }

    pub fn intercept(&self) -> f64 {
        self.line.bias
    }

    pub fn line(&self) -> LineFit {
        self.line
    }

    pub fn predict(&self, x: &Array1<f64>) -> Array1<f64> {
        self.line.predict_all(x)
    }
}

/// Solves `(A^T A) theta = A^T b` through an SVD; singular directions get a zero coefficient.
fn normal_equations(design: DMatrix<f64>, target: DVector<f64>) -> Result<DVector<f64>> {
    let design_t = design.transpose();
    let gram = &design_t * &design;
    let moment = &design_t * &target;

    let eps = f64::EPSILON * gram.amax().max(1.);

    gram.svd(true, true)
        .solve(&moment, eps)
        .map_err(|e| Error::Solve(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn noisy_line(points_n: usize) -> (Vec<f64>, Vec<f64>) {
        noisy_line_seeded(points_n, 7)
    }

    fn noisy_line_seeded(points_n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0., 0.05).unwrap();

        let x: Vec<f64> = Array1::linspace(-1., 1., points_n).to_vec();
        let y = x
            .iter()
            .map(|&x| 3. * x + 2. + noise.sample(&mut rng))
            .collect();

        (x, y)
    }

    #[test]
    fn zero_iterations_returns_origin() {
        let (x, y) = noisy_line(10);

        let fit = train_scratch(&x, &y, 0.01, 0).unwrap();

        assert_eq!(fit, LineFit { weight: 0., bias: 0. });
    }

    #[test]
    fn training_is_deterministic() {
        let (x, y) = noisy_line(50);

        let first = train_scratch(&x, &y, 0.01, 500).unwrap();
        let second = train_scratch(&x, &y, 0.01, 500).unwrap();

        assert_eq!(first.weight.to_bits(), second.weight.to_bits());
        assert_eq!(first.bias.to_bits(), second.bias.to_bits());
    }

    #[test]
    fn converges_to_generating_line() {
        let (x, y) = noisy_line(50);

        let fit = train_scratch(&x, &y, 0.01, 1000).unwrap();

        assert!((fit.weight - 3.).abs() < 0.5, "weight: {}", fit.weight);
        assert!((fit.bias - 2.).abs() < 0.5, "bias: {}", fit.bias);
    }

    #[test]
    fn loss_never_increases_for_small_learning_rate() {
        for seed in [7, 19, 1234] {
            let (x, y) = noisy_line_seeded(50, seed);

            let initial = LineFit::default().mse(&x, &y);
            let losses: Vec<f64> = std::iter::once(initial)
                .chain(
                    GradientDescent::new(&x, &y, 0.01)
                        .unwrap()
                        .take(1000)
                        .map(|fit| fit.mse(&x, &y)),
                )
                .collect();

            for (i, pair) in losses.windows(2).enumerate() {
                assert!(
                    pair[1] <= pair[0] + 1e-12,
                    "seed {seed}: loss went up at iteration {}: {} -> {}",
                    i + 1,
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn loss_history_tracks_every_update() {
        let (x, y) = noisy_line(50);

        let (fit, losses) = train_scratch_with_losses(&x, &y, 0.01, 300).unwrap();

        assert_eq!(fit, train_scratch(&x, &y, 0.01, 300).unwrap());
        assert_eq!(losses.len(), 300);
        assert_eq!(losses[299], fit.mse(&x, &y));
        assert!(losses[0] < LineFit::default().mse(&x, &y));

        let (origin, none) = train_scratch_with_losses(&x, &y, 0.01, 0).unwrap();
        assert_eq!(origin, LineFit::default());
        assert!(none.is_empty());
    }

    #[test]
    fn loss_history_stops_at_divergence() {
        let x = [1e6, 2e6, 3e6, 4e6];
        let y = [1., 2., 3., 4.];

        let result = train_scratch_with_losses(&x, &y, 0.1, 1000);

        assert!(matches!(result, Err(Error::NumericDivergence { .. })));
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let result = train_scratch(&[1., 2., 3.], &[1., 2., 3., 4.], 0.01, 10);

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn rejects_empty_samples() {
        let result = train_scratch(&[], &[], 0.01, 10);

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn rejects_bad_hyperparameters() {
        let x = [1., 2., 3.];
        let y = [2., 4., 6.];

        assert!(matches!(
            train_scratch(&x, &y, 0., 10),
            Err(Error::InvalidHyperparameter(_))
        ));
        assert!(matches!(
            train_scratch(&x, &y, -0.5, 10),
            Err(Error::InvalidHyperparameter(_))
        ));
        assert!(matches!(
            train_scratch(&x, &y, f64::NAN, 10),
            Err(Error::InvalidHyperparameter(_))
        ));
        assert!(matches!(
            train_scratch(&x, &y, 0.01, -1),
            Err(Error::InvalidHyperparameter(_))
        ));
    }

    #[test]
    fn input_errors_take_precedence() {
        let result = train_scratch(&[1.], &[], 0., -1);

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn single_point_converges() {
        let fit = train_scratch(&[5.], &[10.], 0.01, 100).unwrap();

        assert!((fit.predict(5.) - 10.).abs() < 1e-6);
    }

    #[test]
    fn single_point_overshoots_with_large_step() {
        // residual is scaled by 1 - 2 * 0.1 * (5^2 + 1) = -4.2 every step
        let fit = train_scratch(&[5.], &[10.], 0.1, 100).unwrap();

        assert!(fit.is_finite());
        assert!((fit.predict(5.) - 10.).abs() > 10.);
    }

    #[test]
    fn large_scale_inputs_diverge() {
        let x = [1e6, 2e6, 3e6, 4e6];
        let y = [1., 2., 3., 4.];

        let raw_diverges = GradientDescent::new(&x, &y, 0.1)
            .unwrap()
            .take(1000)
            .any(|fit| !fit.is_finite());
        assert!(raw_diverges);

        let result = train_scratch(&x, &y, 0.1, 1000);
        assert!(matches!(result, Err(Error::NumericDivergence { .. })));
    }

    #[test]
    fn least_squares_recovers_exact_line() {
        let x = Array1::linspace(0., 10., 11);
        let y = x.mapv(|x| -1.5 * x + 4.);

        let ols = OrdinaryLeastSquares::fit(&x, &y).unwrap();

        assert!((ols.coefficient() + 1.5).abs() < 1e-10);
        assert!((ols.intercept() - 4.).abs() < 1e-10);

        let predicted = ols.predict(&Array1::from_vec(vec![2.]));
        assert!((predicted[0] - 1.).abs() < 1e-10);
    }

    #[test]
    fn least_squares_constant_feature_predicts_mean() {
        let x = Array1::from_elem(4, 2.);
        let y = Array1::from_vec(vec![1., 2., 3., 6.]);

        let ols = OrdinaryLeastSquares::fit(&x, &y).unwrap();

        assert_eq!(ols.coefficient(), 0.);
        assert!((ols.intercept() - 3.).abs() < 1e-12);
    }

    #[test]
    fn least_squares_agrees_with_gradient_descent() {
        let (x, y) = noisy_line(50);

        let ols =
            OrdinaryLeastSquares::fit(&Array1::from_vec(x.clone()), &Array1::from_vec(y.clone()))
                .unwrap();
        let fit = train_scratch(&x, &y, 0.05, 2000).unwrap();

        assert!((ols.coefficient() - fit.weight).abs() < 1e-3);
        assert!((ols.intercept() - fit.bias).abs() < 1e-3);
    }

    #[test]
    fn least_squares_rejects_bad_input() {
        let empty = Array1::<f64>::zeros(0);
        assert!(matches!(
            OrdinaryLeastSquares::fit(&empty, &empty),
            Err(Error::InvalidInput(_))
        ));

        let x = Array1::from_vec(vec![1., 2.]);
        let y = Array1::from_vec(vec![1.]);
        assert!(matches!(
            OrdinaryLeastSquares::fit(&x, &y),
            Err(Error::InvalidInput(_))
        ));
    }
}
