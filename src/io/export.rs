//! Export aggregated records and rendered charts.
//!
//! Record JSON is the portable form of one aggregation: the merged record plus
//! when it was fetched and from which wiki. It can be read back to re-render the
//! chart without touching the network.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use plotters::backend::DrawingBackend;
use plotters::prelude::BitMapBackend;
use serde::{Deserialize, Serialize};

use crate::domain::MergedRecord;
use crate::error::AppError;
use crate::plot::PixelCanvas;

/// On-disk schema of a record export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFile {
    pub tool: String,
    pub wiki: String,
    pub fetched_at: DateTime<Utc>,
    pub record: MergedRecord,
}

impl RecordFile {
    pub fn new(wiki: &str, record: MergedRecord) -> Self {
        Self {
            tool: "wpulse".to_string(),
            wiki: wiki.to_string(),
            fetched_at: Utc::now(),
            record,
        }
    }
}

/// Write a record JSON file.
pub fn write_record_json(path: &Path, file: &RecordFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create record JSON '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut writer, file)
        .map_err(|e| AppError::new(2, format!("Failed to write record JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write record JSON: {e}")))?;

    Ok(())
}

/// Read a record JSON file.
pub fn read_record_json(path: &Path) -> Result<RecordFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open record JSON '{}': {e}", path.display())))?;
    let record: RecordFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid record JSON: {e}")))?;
    Ok(record)
}

/// Write a rendered chart as a PNG image.
pub fn write_chart_png(path: &Path, canvas: &PixelCanvas) -> Result<(), AppError> {
    fn fail(path: &Path, e: impl Display) -> AppError {
        AppError::new(2, format!("Failed to write chart image '{}': {e}", path.display()))
    }

    let (width, height) = canvas.dimensions();

    let mut backend = BitMapBackend::new(path, (width, height));
    backend
        .blit_bitmap((0, 0), (width, height), canvas.rgb_buffer())
        .map_err(|e| fail(path, e))?;
    backend.present().map_err(|e| fail(path, e))?;

    Ok(())
}
