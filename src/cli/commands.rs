// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`,
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::train_use_case::{ComputeDevice, TrainConfig};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the steering model on a driving log
    Train(TrainArgs),

    /// Predict steering for one frame with the best checkpoint
    Predict(PredictArgs),
}

/// Compute device flag; mapped onto the application's ComputeDevice
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    Cpu,
    Wgpu,
}

impl From<DeviceArg> for ComputeDevice {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Cpu  => ComputeDevice::Cpu,
            DeviceArg::Wgpu => ComputeDevice::Wgpu,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Driving log with one `frame,speed,steering` row per sample
    #[arg(long, default_value = "data/driving_log.csv")]
    pub driving_log: String,

    /// Separate validation log; without it the driving log is split
    #[arg(long)]
    pub valid_log: Option<String>,

    /// Directory for the best checkpoint, configs, metrics and loss chart
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Samples per forward pass
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Share of the driving log used for training when no --valid-log is given
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Seed for weight init, the split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loader worker threads
    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            driving_log:    a.driving_log,
            valid_log:      a.valid_log,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            train_fraction: a.train_fraction,
            seed:           a.seed,
            num_workers:    a.num_workers,
            device:         a.device.into(),
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Raw RGB frame file (66 x 200 x 3 bytes)
    #[arg(long)]
    pub frame: PathBuf,

    /// Vehicle speed when the frame was captured
    #[arg(long, allow_negative_numbers = true)]
    pub speed: f32,

    /// Directory where training saved the best checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,
}
