// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores the best Driver model using Burn's
// CompactRecorder.
//
// Files in the checkpoint directory:
//   driver_best.mpk      ← weights of the best epoch so far (overwritten)
//   driver_config.json   ← DriverConfig, to rebuild the architecture
//   train_config.json    ← hyperparameters of the run
//
// Weights and architecture together make up the full model:
// the config rebuilds an untrained Driver, the record fills
// in its parameters.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{anyhow, Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{Driver, DriverConfig};

/// File stem of the best-model checkpoint; the recorder appends the extension
pub const BEST_MODEL_STEM: &str = "driver_best";

/// Extension CompactRecorder gives its files
const RECORD_EXTENSION: &str = "mpk";

const MODEL_CONFIG_FILE: &str = "driver_config.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";

/// Best validation loss assumed before the first epoch
pub const INITIAL_BEST_LOSS: f64 = 1_000_000.0;

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path of the weights file as written on disk
    pub fn best_model_path(&self) -> PathBuf {
        self.dir.join(format!("{BEST_MODEL_STEM}.{RECORD_EXTENSION}"))
    }

    /// Overwrite the best-model checkpoint with `model`'s parameters.
    pub fn save_best<B: Backend>(&self, model: &Driver<B>) -> Result<()> {
        let path = self.dir.join(BEST_MODEL_STEM);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        tracing::debug!("Saved best model to '{}'", self.best_model_path().display());
        Ok(())
    }

    /// Load the best-model weights into `model`.
    ///
    /// `model` must have the architecture the checkpoint was written with.
    pub fn load_best<B: Backend>(
        &self,
        model:  Driver<B>,
        device: &B::Device,
    ) -> Result<Driver<B>> {
        let path = self.dir.join(BEST_MODEL_STEM);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Rebuild the saved architecture and load the best weights into it.
    pub fn load_full<B: Backend>(&self, device: &B::Device) -> Result<(DriverConfig, Driver<B>)> {
        let config = self.load_model_config()?;
        let model  = self.load_best(config.init(device), device)?;
        Ok((config, model))
    }

    pub fn save_model_config(&self, config: &DriverConfig) -> Result<()> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        config
            .save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_model_config(&self) -> Result<DriverConfig> {
        let path = self.dir.join(MODEL_CONFIG_FILE);
        DriverConfig::load(&path).map_err(|e| {
            anyhow!(
                "Cannot read model config from '{}': {e}. Make sure you have run 'train' first.",
                path.display()
            )
        })
    }

    /// Save the run's hyperparameters to JSON.
    pub fn save_train_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(TRAIN_CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

// ─── BestCheckpoint ───────────────────────────────────────────────────────────
/// Running minimum of the validation loss. The checkpoint file is
/// rewritten only when a new epoch strictly undercuts it.
#[derive(Debug, Clone)]
pub struct BestCheckpoint {
    best_loss:  f64,
    best_epoch: Option<usize>,
}

impl Default for BestCheckpoint {
    fn default() -> Self {
        Self { best_loss: INITIAL_BEST_LOSS, best_epoch: None }
    }
}

impl BestCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    /// Save `model` if `val_loss` beats the best so far. Returns whether it did.
    /// NaN never counts as an improvement.
    pub fn update<B: Backend>(
        &mut self,
        epoch:    usize,
        val_loss: f64,
        model:    &Driver<B>,
        ckpt:     &CheckpointManager,
    ) -> Result<bool> {
        if val_loss.is_nan() || val_loss >= self.best_loss {
            return Ok(false);
        }
        ckpt.save_best(model)?;
        tracing::info!(
            "Validation loss improved {:.6} -> {:.6}, checkpoint saved",
            self.best_loss,
            val_loss
        );
        self.best_loss  = val_loss;
        self.best_epoch = Some(epoch);
        Ok(true)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::record::FileRecorder;
    use std::{path::Path, thread, time::Duration};

    type TestBackend = burn::backend::NdArray<f32>;

    fn modified(path: &Path) -> std::time::SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_checkpoint_only_rewritten_on_improvement() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let model: Driver<TestBackend> = DriverConfig::new().init(&device);
        let mut best = BestCheckpoint::new();

        assert!(best.update(1, 10.0, &model, &ckpt).unwrap());
        let path = ckpt.best_model_path();
        assert!(path.exists());
        let first_write = modified(&path);

        // Equal and worse losses leave the file alone.
        assert!(!best.update(2, 10.0, &model, &ckpt).unwrap());
        assert!(!best.update(3, 25.0, &model, &ckpt).unwrap());
        assert!(!best.update(4, f64::NAN, &model, &ckpt).unwrap());
        assert_eq!(modified(&path), first_write);
        assert_eq!(best.best_epoch(), Some(1));

        // An improvement writes it again.
        thread::sleep(Duration::from_millis(1100));
        assert!(best.update(5, 4.0, &model, &ckpt).unwrap());
        assert_ne!(modified(&path), first_write);
        assert_eq!(best.best_loss(), 4.0);
        assert_eq!(best.best_epoch(), Some(5));
    }

    #[test]
    fn test_best_model_path_is_the_written_file() {
        assert_eq!(
            <CompactRecorder as FileRecorder<TestBackend>>::file_extension(),
            RECORD_EXTENSION
        );

        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let model: Driver<TestBackend> = DriverConfig::new().init(&device);
        ckpt.save_best(&model).unwrap();

        let written: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(written, vec![ckpt.best_model_path()]);
    }

    #[test]
    fn test_first_epoch_always_beats_sentinel() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let model: Driver<TestBackend> = DriverConfig::new().init(&device);
        let mut best = BestCheckpoint::new();
        assert!(best.update(1, 999_999.0, &model, &ckpt).unwrap());
    }

    #[test]
    fn test_full_model_round_trip() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let config = DriverConfig::new().with_dropout(0.25);
        let model: Driver<TestBackend> = config.init(&device);

        ckpt.save_model_config(&config).unwrap();
        ckpt.save_best(&model).unwrap();

        let (loaded_cfg, loaded) = ckpt.load_full::<TestBackend>(&device).unwrap();
        assert_eq!(loaded_cfg.dropout, 0.25);
        assert_eq!(loaded_cfg.flattened_size(), 1152);
        assert_eq!(loaded.lin1.weight.dims(), model.lin1.weight.dims());
    }

    #[test]
    fn test_load_without_training_fails() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        assert!(ckpt.load_full::<TestBackend>(&Default::default()).is_err());
    }

    #[test]
    fn test_train_config_round_trip() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let cfg  = TrainConfig { epochs: 3, ..TrainConfig::default() };
        ckpt.save_train_config(&cfg).unwrap();

        let json = fs::read_to_string(tmp.path().join(TRAIN_CONFIG_FILE)).unwrap();
        let loaded: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.epochs, 3);
    }
}
