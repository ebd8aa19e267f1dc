use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::check_hyperparameters;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub random_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub csv_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitConfig {
    pub feature_column: String,
    pub target_column: String,
    pub test_size: f64,
    #[serde(default)]
    pub normalize: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManualLrConfig {
    pub learning_rate: f64,
    pub iterations: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputsConfig {
    pub results_csv: PathBuf,
    #[serde(default)]
    pub plot_path: Option<PathBuf>,
}

/// Experiment description, usually read from `configs/experiment_config.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    pub data: DataConfig,
    pub experiment: SplitConfig,
    pub manual_lr: ManualLrConfig,
    pub outputs: OutputsConfig,
}

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;

        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let split = &self.experiment;

        if !(split.test_size > 0. && split.test_size < 1.) {
            return Err(Error::InvalidConfig(format!(
                "experiment.test_size must lie in (0, 1), got {}",
                split.test_size
            )));
        }

        if split.feature_column.trim().is_empty() || split.target_column.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "feature and target column names must not be empty".to_string(),
            ));
        }

        check_hyperparameters(self.manual_lr.learning_rate, self.manual_lr.iterations)?;

        Ok(())
    }
}

/// Default project root for a config file: the directory above the one holding it.
pub fn default_project_root(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

pub fn resolve(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
