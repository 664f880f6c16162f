// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates a full training run:
//
//   Step 1: Load the driving log(s)       (Layer 4 - data)
//   Step 2: Split train/validation        (Layer 4 - data)
//   Step 3: Build datasets                (Layer 4 - data)
//   Step 4: Save config                   (Layer 6 - infra)
//   Step 5: Run training loop             (Layer 5 - ml)
//   Step 6: Write per-epoch metrics CSV   (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::DrivingDataset,
    loader::DrivingLogLoader,
    splitter::split_train_val,
};
use crate::domain::{loss_history::LossHistory, traits::DrivingSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    plot::LossPlotter,
};
use crate::ml::trainer::run_training;

/// Where the tensors live during training and inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    /// ndarray backend on the host CPU
    #[default]
    Cpu,
    /// wgpu backend on the default GPU adapter
    Wgpu,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the checkpoint so a run can be traced back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub driving_log:    String,
    /// Separate validation log; when absent the driving log is split
    pub valid_log:      Option<String>,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    /// Share of samples used for training when splitting a single log
    pub train_fraction: f64,
    pub seed:           u64,
    pub num_workers:    usize,
    pub device:         ComputeDevice,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            driving_log:    "data/driving_log.csv".to_string(),
            valid_log:      None,
            checkpoint_dir: "checkpoints".to_string(),
            batch_size:     32,
            epochs:         10,
            lr:             1e-4,
            train_fraction: 0.8,
            seed:           42,
            num_workers:    2,
            device:         ComputeDevice::Cpu,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be positive");
        }
        if self.epochs == 0 {
            bail!("epochs must be positive");
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            bail!("learning rate must be a positive number, got {}", self.lr);
        }
        if !(0.0..=1.0).contains(&self.train_fraction) {
            bail!("train_fraction must be within [0, 1], got {}", self.train_fraction);
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<LossHistory> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Steps 1-2: Load samples and split ─────────────────────────────────
        tracing::info!("Loading driving log '{}'", cfg.driving_log);
        let samples = DrivingLogLoader::new(&cfg.driving_log).load_all()?;

        let (train_samples, val_samples) = match &cfg.valid_log {
            Some(valid_log) => {
                tracing::info!("Loading validation log '{}'", valid_log);
                (samples, DrivingLogLoader::new(valid_log).load_all()?)
            }
            None => split_train_val(samples, cfg.train_fraction, cfg.seed),
        };
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        if train_samples.is_empty() {
            bail!("No training samples found in '{}'", cfg.driving_log);
        }
        if val_samples.is_empty() {
            tracing::warn!("Validation set is empty; no checkpoint will be written");
        }

        // ── Step 3: Build Burn datasets ───────────────────────────────────────
        let train_dataset = DrivingDataset::new(train_samples);
        let val_dataset   = DrivingDataset::new(val_samples);
        tracing::debug!(
            "Datasets ready: {} / {} samples",
            train_dataset.sample_count(),
            val_dataset.sample_count()
        );

        // ── Step 4: Save config ───────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_train_config(cfg)?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        let plotter = LossPlotter::new(&cfg.checkpoint_dir);
        let history = run_training(cfg, train_dataset, val_dataset, &ckpt_manager, &plotter)?;

        // ── Step 6: Metrics CSV ───────────────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        metrics.log_history(&history)?;
        tracing::info!("Metrics written to '{}'", metrics.csv_path().display());

        Ok(history)
    }
}
