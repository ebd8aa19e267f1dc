use std::path::Path;

use csv::StringRecord;
use log::info;
use ndarray::Array1;

use crate::error::{Error, Result};

/// A headered CSV held in memory as raw string records.
#[derive(Debug, Clone)]
pub struct Table {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl Table {
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parses the named column as `f64`. Surrounding whitespace is ignored and
    /// non-finite cells (`NaN`, `inf`) are rejected.
    pub fn column(&self, name: &str) -> Result<Array1<f64>> {
        let idx = self
            .headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;

        self.records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let value = record.get(idx).unwrap_or_default();

                match value.trim().parse::<f64>() {
                    Ok(parsed) if parsed.is_finite() => Ok(parsed),
                    _ => Err(Error::InvalidValue {
                        column: name.to_string(),
                        row: row + 1,
                        value: value.to_string(),
                    }),
                }
            })
            .collect()
    }
}

pub fn read_csv<R: std::io::Read>(reader: R) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(reader);

    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Table { headers, records })
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;

    let table = read_csv(file)?;
    info!("loaded {} rows from {}", table.len(), path.display());

    Ok(table)
}
