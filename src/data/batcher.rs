// ============================================================
// Layer 4 - Driving Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<DrivingSample>
// into tensors on the target device.
//
// Layout of a batch of N samples:
//   images   → [N, FRAME_HEIGHT, FRAME_WIDTH, 3]  raw 0..255 floats
//   speeds   → [N]
//   steering → [N]
//
// Images stay channel-last here; the trainer permutes them to
// [N, 3, H, W] right before the forward pass.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::driving_sample::{DrivingSample, FRAME_CHANNELS, FRAME_HEIGHT, FRAME_WIDTH};

// ─── DrivingBatch ─────────────────────────────────────────────────────────────
/// A batch of driving samples ready for the model.
/// All tensors have batch_size as their first dimension.
#[derive(Debug, Clone)]
pub struct DrivingBatch<B: Backend> {
    /// Raw pixel intensities, shape [batch, H, W, C]
    pub images: Tensor<B, 4>,

    /// Vehicle speed per sample, shape [batch]
    pub speeds: Tensor<B, 1>,

    /// Steering label per sample, shape [batch]
    pub steering: Tensor<B, 1>,
}

// ─── DrivingBatcher ───────────────────────────────────────────────────────────
/// Holds the device the batch tensors are created on.
#[derive(Clone, Debug)]
pub struct DrivingBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> DrivingBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<DrivingSample, DrivingBatch<B>> for DrivingBatcher<B> {
    fn batch(&self, items: Vec<DrivingSample>) -> DrivingBatch<B> {
        let batch_size = items.len();

        // [s1_px1_r, s1_px1_g, s1_px1_b, ..., sN_pxM_b] → [N, H, W, C]
        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.frame.iter().map(|&p| p as f32))
            .collect();
        let speeds: Vec<f32>   = items.iter().map(|s| s.speed).collect();
        let steering: Vec<f32> = items.iter().map(|s| s.steering).collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, FRAME_HEIGHT, FRAME_WIDTH, FRAME_CHANNELS]);
        let speeds   = Tensor::<B, 1>::from_floats(speeds.as_slice(), &self.device);
        let steering = Tensor::<B, 1>::from_floats(steering.as_slice(), &self.device);

        DrivingBatch { images, speeds, steering }
    }
}
