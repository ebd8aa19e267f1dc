use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use linreg_experiment::config::{default_project_root, ExperimentConfig};
use linreg_experiment::experiment;

#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
#[command(about = "Compares closed-form and gradient-descent linear regression")]
struct Args {
    #[clap(short, long, default_value = "configs/experiment_config.yaml")]
    config: PathBuf,

    /// Directory that relative paths in the config are resolved against.
    /// Defaults to the parent of the config file's directory.
    #[clap(short, long)]
    project_root: Option<PathBuf>,
}

fn run(args: Args) -> linreg_experiment::Result<()> {
    let config = ExperimentConfig::load(&args.config)?;

    let project_root = args
        .project_root
        .unwrap_or_else(|| default_project_root(&args.config));

    let report = experiment::run(&config, &project_root)?;

    for model in &report.models {
        info!(
            "{:<8} rmse = {:.4}  mae = {:.4}  r2 = {:.4}",
            model.name, model.metrics.rmse, model.metrics.mae, model.metrics.r2
        );
    }

    info!(
        "experiment complete, results saved to {}",
        report.results_csv.display()
    );

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        error!("{e}");
        std::process::exit(1);
    }
}
