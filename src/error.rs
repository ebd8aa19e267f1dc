use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    /// Gradient descent left the finite range, usually a learning rate too
    /// large for the scale of the data.
    #[error("parameters diverged at iteration {iteration}: weight = {weight}, bias = {bias}")]
    NumericDivergence {
        iteration: usize,
        weight: f64,
        bias: f64,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("column `{0}` not found")]
    MissingColumn(String),

    #[error("column `{column}`, row {row}: `{value}` is not a number")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("least squares solve failed: {0}")]
    Solve(String),

    #[error("plotting failed: {0}")]
    Plot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
