use std::path::{Path, PathBuf};

use log::info;

use crate::config::{resolve, ExperimentConfig};
use crate::data_loader::load_csv;
use crate::error::{Error, Result};
use crate::evaluation::{metrics, Metrics};
use crate::model::{train_scratch, train_scratch_with_losses, LineFit, OrdinaryLeastSquares};
use crate::plots::save_experiment_plot;
use crate::preprocessing::{normalize, split};
use crate::results::{append_results, ResultRow};

/// Name of the closed-form model in the results table.
pub const OLS_MODEL: &str = "sklearn";
pub const SCRATCH_MODEL: &str = "scratch";

#[derive(Debug, Clone)]
pub struct ModelReport {
    pub name: &'static str,
    pub fit: LineFit,
    pub metrics: Metrics,
}

#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub train_size: usize,
    pub test_size: usize,
    pub models: Vec<ModelReport>,
    pub results_csv: PathBuf,
    pub plot_path: Option<PathBuf>,
}

pub fn run(config: &ExperimentConfig, project_root: &Path) -> Result<ExperimentReport> {
    let csv_path = resolve(project_root, &config.data.csv_path);
    let table = load_csv(&csv_path)?;

    let x = table.column(&config.experiment.feature_column)?;
    let y = table.column(&config.experiment.target_column)?;

    let mut data = split(
        &x,
        &y,
        config.experiment.test_size,
        config.project.random_seed,
    )?;
    info!(
        "split {} samples into {} train / {} test",
        x.len(),
        data.x_train.len(),
        data.x_test.len()
    );

    if config.experiment.normalize {
        let (x_train, x_test) = normalize(&data.x_train, &data.x_test)?;
        data.x_train = x_train;
        data.x_test = x_test;
    }

    let ols = OrdinaryLeastSquares::fit(&data.x_train, &data.y_train)?;
    let ols_metrics = metrics(&data.y_test, &ols.predict(&data.x_test))?;
    info!(
        "{OLS_MODEL}: w = {:.6}, b = {:.6}, rmse = {:.6}, mae = {:.6}, r2 = {:.6}",
        ols.coefficient(),
        ols.intercept(),
        ols_metrics.rmse,
        ols_metrics.mae,
        ols_metrics.r2
    );

    let x_train = data.x_train.to_vec();
    let y_train = data.y_train.to_vec();
    let manual = config.manual_lr;

    let (scratch, losses) = if config.outputs.plot_path.is_some() {
        train_scratch_with_losses(&x_train, &y_train, manual.learning_rate, manual.iterations)?
    } else {
        let fit = train_scratch(&x_train, &y_train, manual.learning_rate, manual.iterations)?;
        (fit, Vec::new())
    };
    let scratch_metrics = metrics(&data.y_test, &scratch.predict_all(&data.x_test))?;
    info!(
        "{SCRATCH_MODEL}: w = {:.6}, b = {:.6}, rmse = {:.6}, mae = {:.6}, r2 = {:.6}",
        scratch.weight, scratch.bias, scratch_metrics.rmse, scratch_metrics.mae, scratch_metrics.r2
    );

    let models = vec![
        ModelReport {
            name: OLS_MODEL,
            fit: ols.line(),
            metrics: ols_metrics,
        },
        ModelReport {
            name: SCRATCH_MODEL,
            fit: scratch,
            metrics: scratch_metrics,
        },
    ];

    // plot first: a failed render must not leave rows in the results table
    let plot_path = match &config.outputs.plot_path {
        Some(path) => {
            let path = resolve(project_root, path);
            let lines: Vec<(&str, LineFit)> = models.iter().map(|m| (m.name, m.fit)).collect();

            save_experiment_plot(
                &path,
                &data.x_test.to_vec(),
                &data.y_test.to_vec(),
                &lines,
                &losses,
            )
            .map_err(|e| Error::Plot(e.to_string()))?;
            info!("plot saved to {}", path.display());

            Some(path)
        }
        None => None,
    };

    let results_csv = resolve(project_root, &config.outputs.results_csv);
    let rows: Vec<ResultRow> = models
        .iter()
        .map(|m| ResultRow::new(m.name, m.metrics))
        .collect();
    append_results(&results_csv, &rows)?;

    Ok(ExperimentReport {
        train_size: data.x_train.len(),
        test_size: data.x_test.len(),
        models,
        results_csv,
        plot_path,
    })
}
