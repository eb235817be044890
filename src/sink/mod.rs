// src/sink/mod.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{Result, ScrapeError};
use crate::process::NormalizedDataset;

pub mod csv;
pub mod parquet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SinkFormat {
    #[default]
    Csv,
    Parquet,
}

impl SinkFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SinkFormat::Csv => "csv",
            SinkFormat::Parquet => "parquet",
        }
    }
}

/// `<out_dir>/<stem>.<ext>`
pub fn output_path(out_dir: &Path, stem: &str, format: SinkFormat) -> PathBuf {
    out_dir.join(format!("{}.{}", stem, format.extension()))
}

/// Write `dataset` to `path`, replacing any file already there. The data is
/// written to a hidden sibling first and renamed into place.
pub fn persist(dataset: &NormalizedDataset, path: &Path, format: SinkFormat) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| ScrapeError::persist(dir, e))?;
    }
    let tmp = staging_path(path);
    let written = match format {
        SinkFormat::Csv => csv::write(dataset, &tmp),
        SinkFormat::Parquet => parquet::write(dataset, &tmp),
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path).map_err(|e| ScrapeError::persist(path, e))?;
    Ok(path.to_path_buf())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}
