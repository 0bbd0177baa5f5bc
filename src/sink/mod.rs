//! Report writers.
//!
//! The format follows the output extension: `.json` writes the full report
//! (summary plus every outcome, ERROR outcomes included), anything else
//! writes CSV with one row per symbol instance.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::ScanError;
use crate::report::Report;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
}

impl ReportFormat {
    /// `.json` (any case) is JSON; every other extension is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Csv,
        }
    }
}

/// Writes `report` to `path`, creating parent directories as needed.
pub fn write_report(path: &Path, report: &Report) -> Result<ReportFormat, ScanError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let format = ReportFormat::from_path(path);
    match format {
        ReportFormat::Json => write_json(path, report)?,
        ReportFormat::Csv => write_csv(path, report)?,
    }
    info!("Wrote {:?} report to {}", format, path.display());
    Ok(format)
}

fn write_json(path: &Path, report: &Report) -> Result<(), ScanError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|source| {
        ScanError::ReportJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush()?;
    Ok(())
}

fn write_csv(path: &Path, report: &Report) -> Result<(), ScanError> {
    let file = File::create(path)?;
    let mut csv_writer = csv::Writer::from_writer(BufWriter::new(file));

    for row in report.symbol_rows() {
        csv_writer
            .serialize(&row)
            .map_err(|source| ScanError::ReportCsvWrite {
                path: path.to_path_buf(),
                source,
            })?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| ScanError::Io(e.into_error()))?
        .flush()?;
    Ok(())
}
