pub mod config;
pub mod data_loader;
pub mod error;
pub mod evaluation;
pub mod experiment;
pub mod model;
pub mod plots;
pub mod preprocessing;
pub mod results;

pub use error::{Error, Result};
pub use model::{
    train_scratch, train_scratch_with_losses, GradientDescent, LineFit, OrdinaryLeastSquares,
};
