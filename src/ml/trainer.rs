// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Fixed-epoch train + validation loop with Adam and a
// best-by-validation-loss checkpoint.
//
// Per epoch:
//   1. Training phase on the autodiff backend: forward, sum of
//      squared errors, backward, one Adam step per batch.
//   2. Validation phase on model.valid() (inner backend, no
//      autodiff, channel dropout becomes the identity).
//   3. Save the model if the mean validation loss is a new best.
// After the last epoch the loss histories go to the visualizer.
//
// Burn notes:
//   - Training batches live on B (Autodiff<...>)
//   - model.valid() returns the model on B::InnerBackend, so the
//     validation batcher must also use B::InnerBackend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use std::sync::Arc;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{ComputeDevice, TrainConfig};
use crate::data::{
    batcher::{DrivingBatch, DrivingBatcher},
    dataset::DrivingDataset,
};
use crate::domain::{loss_history::LossHistory, traits::LossVisualizer};
use crate::infra::checkpoint::{BestCheckpoint, CheckpointManager};
use crate::ml::model::{Driver, DriverConfig};

type CpuBackend  = burn::backend::NdArray;
type WgpuBackend = burn::backend::Wgpu;

/// Label handed to the visualizer with the loss curves
pub const LOSS_METRIC: &str = "Losses";

/// Epoch count and step size for one call to [`train`]
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub epochs:        usize,
    pub learning_rate: f64,
}

/// What a finished training run hands back
pub struct TrainingOutcome<B: AutodiffBackend> {
    /// Model after the final epoch (not necessarily the best one)
    pub model:         Driver<B>,
    pub history:       LossHistory,
    pub best_val_loss: f64,
    /// 1-based epoch of the saved checkpoint, if any epoch improved
    pub best_epoch:    Option<usize>,
}

/// Build the model and data loaders for `cfg` on the requested device
/// and run [`train`].
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: DrivingDataset,
    val_dataset:   DrivingDataset,
    ckpt_manager:  &CheckpointManager,
    visualizer:    &dyn LossVisualizer,
) -> Result<LossHistory> {
    match cfg.device {
        ComputeDevice::Cpu => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            tracing::info!("Using CPU (ndarray) device: {:?}", device);
            train_loop::<burn::backend::Autodiff<CpuBackend>>(
                cfg, train_dataset, val_dataset, ckpt_manager, visualizer, device,
            )
        }
        ComputeDevice::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<burn::backend::Autodiff<WgpuBackend>>(
                cfg, train_dataset, val_dataset, ckpt_manager, visualizer, device,
            )
        }
    }
}

fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: DrivingDataset,
    val_dataset:   DrivingDataset,
    ckpt_manager:  &CheckpointManager,
    visualizer:    &dyn LossVisualizer,
    device:        B::Device,
) -> Result<LossHistory> {
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = DriverConfig::new();
    ckpt_manager.save_model_config(&model_cfg)?;
    let model: Driver<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {}x{} input, {} flattened conv features",
        model_cfg.image_height,
        model_cfg.image_width,
        model_cfg.flattened_size()
    );

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(DrivingBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers.max(1))
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, no autodiff overhead) ───────────
    let val_loader = DataLoaderBuilder::new(DrivingBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers.max(1))
        .build(val_dataset);

    let opts = TrainOptions { epochs: cfg.epochs, learning_rate: cfg.lr };
    let outcome = train(model, &device, &opts, train_loader, val_loader, ckpt_manager, visualizer)?;

    match outcome.best_epoch {
        Some(epoch) => tracing::info!(
            "Training complete! Best validation loss {:.6} at epoch {}",
            outcome.best_val_loss,
            epoch
        ),
        None => tracing::warn!("Training complete, but no epoch produced a checkpoint"),
    }
    tracing::debug!("Final model holds {} parameters", outcome.model.num_params());
    Ok(outcome.history)
}

/// Run `opts.epochs` epochs of training and validation.
///
/// The best model by validation loss is written through `ckpt_manager`;
/// the loss histories are passed to `visualizer` once all epochs finish.
pub fn train<B: AutodiffBackend>(
    model:        Driver<B>,
    device:       &B::Device,
    opts:         &TrainOptions,
    train_loader: Arc<dyn DataLoader<DrivingBatch<B>>>,
    val_loader:   Arc<dyn DataLoader<DrivingBatch<B::InnerBackend>>>,
    ckpt_manager: &CheckpointManager,
    visualizer:   &dyn LossVisualizer,
) -> Result<TrainingOutcome<B>> {
    let mut model = model.fork(device);

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let mut history = LossHistory::new();
    let mut best    = BestCheckpoint::new();

    for epoch in 1..=opts.epochs {
        println!("Epoch {}/{}", epoch, opts.epochs);

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (images, speeds) = model_inputs(batch.images, batch.speeds);
            let (loss, _) = model.forward_loss(images, speeds, batch.steering);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            // Backward pass + Adam update; gradients are consumed by the step
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(opts.learning_rate, model, grads);
        }

        let avg_train_loss = mean(train_loss_sum, train_batches);
        println!("Training: Loss={avg_train_loss}");

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;

        for batch in val_loader.iter() {
            let (images, speeds) = model_inputs(batch.images, batch.speeds);
            let (loss, _) = model_valid.forward_loss(images, speeds, batch.steering);

            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;
        }

        let avg_val_loss = mean(val_loss_sum, val_batches);
        println!("Validation: Loss={avg_val_loss}\n");

        history.record(avg_train_loss, avg_val_loss);
        tracing::debug!(
            "Epoch {} done: {} training batches, {} validation batches",
            epoch,
            train_batches,
            val_batches
        );

        best.update(epoch, avg_val_loss, &model, ckpt_manager)?;
    }

    if let Err(e) = visualizer.vis_train(
        &history.training,
        &history.validation,
        opts.epochs,
        LOSS_METRIC,
    ) {
        tracing::warn!("Could not visualise training losses: {:#}", e);
    }

    Ok(TrainingOutcome {
        model,
        history,
        best_val_loss: best.best_loss(),
        best_epoch:    best.best_epoch(),
    })
}

/// Channel-last images [N, H, W, C] → [N, C, H, W]; speeds [N] → [N, 1]
fn model_inputs<B: Backend>(images: Tensor<B, 4>, speeds: Tensor<B, 1>) -> (Tensor<B, 4>, Tensor<B, 2>) {
    (images.permute([0, 3, 1, 2]), speeds.unsqueeze_dim::<2>(1))
}

/// Mean of per-batch losses; NaN when there were no batches.
fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { f64::NAN }
}
