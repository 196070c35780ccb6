use crate::common::constants::CANONICAL_COLUMNS;
use crate::common::error::{Result, ScraperError};
use crate::common::types::NormalizedRecord;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::Path;
use tracing::info;

/// Spreadsheet formats the writer can produce, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(OutputFormat::Xlsx),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

/// Write the records to `path` with a canonical header row, replacing any existing file
pub fn write_records(path: &Path, records: &[NormalizedRecord]) -> Result<()> {
    let failure = |message: String| ScraperError::OutputWriteFailure {
        path: path.display().to_string(),
        message,
    };

    let format = OutputFormat::from_path(path)
        .ok_or_else(|| failure("unsupported extension, expected .xlsx or .csv".to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| failure(e.to_string()))?;
    }

    let written = match format {
        OutputFormat::Xlsx => write_xlsx(path, records),
        OutputFormat::Csv => write_csv(path, records),
    };
    written.map_err(|e| failure(e.to_string()))?;

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

fn write_csv(path: &Path, records: &[NormalizedRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CANONICAL_COLUMNS)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_xlsx(path: &Path, records: &[NormalizedRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in CANONICAL_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, value) in record.to_row().iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row, col as u16, *value)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
