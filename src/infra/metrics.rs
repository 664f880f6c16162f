// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Records per-epoch losses to a CSV file.
//
// Output file: <checkpoint_dir>/metrics.csv
//
//   epoch,train_loss,val_loss,improved
//   1,412.503100,380.112900,true
//   2,301.220400,395.004700,false
//   ...
//
// `improved` marks the epochs whose validation loss produced
// a new best checkpoint.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

use crate::domain::loss_history::LossHistory;
use crate::infra::checkpoint::INITIAL_BEST_LOSS;

const CSV_HEADER: &str = "epoch,train_loss,val_loss,improved";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean sum-of-squared-errors over all training batches
    pub train_loss: f64,

    /// Mean sum-of-squared-errors over all validation batches
    pub val_loss: f64,

    /// Whether this epoch's val_loss beat every earlier epoch
    pub improved: bool,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, improved: bool) -> Self {
        Self { epoch, train_loss, val_loss, improved }
    }

    /// One row per epoch of `history`
    pub fn from_history(history: &LossHistory) -> Vec<Self> {
        let improvements = history.improvements(INITIAL_BEST_LOSS);
        history
            .training
            .iter()
            .zip(&history.validation)
            .zip(improvements)
            .enumerate()
            .map(|(i, ((&train, &val), improved))| Self::new(i + 1, train, val, improved))
            .collect()
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger, starting a fresh CSV with a header row.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "{CSV_HEADER}")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.improved,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    /// Append every epoch of `history`
    pub fn log_history(&self, history: &LossHistory) -> Result<()> {
        for m in EpochMetrics::from_history(history) {
            self.log(&m)?;
        }
        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
