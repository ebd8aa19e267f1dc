use std::fs::OpenOptions;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::evaluation::Metrics;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub model: String,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl ResultRow {
    pub fn new(model: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            model: model.into(),
            rmse: metrics.rmse,
            mae: metrics.mae,
            r2: metrics.r2,
        }
    }
}

/// Appends `rows` to the results table, writing the header only when the file is new.
pub fn append_results(path: &Path, rows: &[ResultRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file_exists = path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("appended {} rows to {}", rows.len(), path.display());

    Ok(())
}
