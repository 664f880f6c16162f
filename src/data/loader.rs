// ============================================================
// Layer 4 - Driving Log Loader
// ============================================================
// Reads a driving log and the raw camera frames it points to.
//
// Log format (one sample per line):
//   frame,speed,steering          ← optional header
//   # comment lines are ignored
//   frames/000001.rgb,12.5,-0.04
//
// Relative frame paths are resolved against the directory that
// contains the log. Each frame file must hold exactly FRAME_LEN
// raw RGB bytes.
//
// A malformed row or an unreadable frame is skipped with a
// warning. A missing or unreadable log is an error.
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::driving_sample::{DrivingRecord, DrivingSample};
use crate::domain::traits::DrivingSource;

/// Loads (frame, speed, steering) samples listed in a driving log.
pub struct DrivingLogLoader {
    /// Path to the log file
    log_path: PathBuf,
}

impl DrivingLogLoader {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self { log_path: log_path.into() }
    }

    /// Parse the log into records without touching the frame files.
    pub fn read_records(&self) -> Result<Vec<DrivingRecord>> {
        let text = fs::read_to_string(&self.log_path)
            .with_context(|| format!("Cannot read driving log '{}'", self.log_path.display()))?;

        let mut records = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || DrivingRecord::is_header(trimmed) {
                continue;
            }
            match DrivingRecord::from_csv_line(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    "Skipping {}:{}: {:#}",
                    self.log_path.display(),
                    line_no + 1,
                    e
                ),
            }
        }

        tracing::debug!("Parsed {} records from '{}'", records.len(), self.log_path.display());
        Ok(records)
    }

    /// Resolve a frame path from the log against the log's directory.
    fn resolve(&self, frame_path: &str) -> PathBuf {
        let path = Path::new(frame_path);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.log_path
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }
}

impl DrivingSource for DrivingLogLoader {
    fn load_all(&self) -> Result<Vec<DrivingSample>> {
        let records = self.read_records()?;
        let mut samples = Vec::with_capacity(records.len());

        for record in records {
            let path = self.resolve(&record.frame_path);
            match load_frame(&path)
                .and_then(|frame| DrivingSample::new(frame, record.speed, record.steering))
            {
                Ok(sample) => samples.push(sample),
                Err(e) => tracing::warn!("Skipping frame '{}': {:#}", path.display(), e),
            }
        }

        tracing::info!(
            "Loaded {} driving samples from '{}'",
            samples.len(),
            self.log_path.display()
        );
        Ok(samples)
    }
}

/// Read a raw RGB frame file.
pub fn load_frame(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Cannot read frame '{}'", path.display()))
}
