// ============================================================
// Layer 5 - Steering Predictor
// ============================================================
// Loads the best checkpoint and predicts a steering command
// for a single raw frame.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::domain::driving_sample::FRAME_CHANNELS;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{Driver, DriverConfig};

pub struct SteeringPredictor<B: Backend> {
    model:  Driver<B>,
    config: DriverConfig,
    device: B::Device,
}

impl<B: Backend> SteeringPredictor<B> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let (config, model) = ckpt_manager.load_full::<B>(&device)?;
        tracing::info!("Model loaded from '{}'", ckpt_manager.best_model_path().display());
        Ok(Self { model, config, device })
    }

    /// Bytes expected in one raw frame for the loaded architecture
    pub fn frame_len(&self) -> usize {
        self.config.image_height * self.config.image_width * FRAME_CHANNELS
    }

    /// Predict steering for one channel-last RGB frame and the current speed.
    pub fn predict(&self, frame: &[u8], speed: f32) -> Result<f32> {
        if frame.len() != self.frame_len() {
            return Err(anyhow!(
                "frame has {} bytes, model expects {} ({}x{}x{})",
                frame.len(),
                self.frame_len(),
                self.config.image_height,
                self.config.image_width,
                FRAME_CHANNELS
            ));
        }

        let pixels: Vec<f32> = frame.iter().map(|&p| p as f32).collect();
        let image = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([1, self.config.image_height, self.config.image_width, FRAME_CHANNELS])
            .permute([0, 3, 1, 2]);
        let speed = Tensor::<B, 1>::from_floats([speed], &self.device).unsqueeze_dim::<2>(1);

        let steering: Vec<f32> = self
            .model
            .forward(image, speed)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read prediction: {e:?}"))?;

        steering
            .first()
            .copied()
            .ok_or_else(|| anyhow!("Model returned no prediction"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::driving_sample::FRAME_LEN;

    type TestBackend = burn::backend::NdArray<f32>;

    #[test]
    fn test_predict_from_saved_checkpoint() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let config = DriverConfig::new();
        let model: Driver<TestBackend> = config.init(&device);
        ckpt.save_model_config(&config).unwrap();
        ckpt.save_best(&model).unwrap();

        let predictor = SteeringPredictor::<TestBackend>::from_checkpoint(&ckpt, device).unwrap();
        assert_eq!(predictor.frame_len(), FRAME_LEN);

        let frame = vec![128u8; FRAME_LEN];
        let a = predictor.predict(&frame, 10.0).unwrap();
        let b = predictor.predict(&frame, 10.0).unwrap();
        assert!(a.is_finite());
        assert_eq!(a, b);
    }

    #[test]
    fn test_predict_rejects_wrong_frame_size() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let config = DriverConfig::new();
        let model: Driver<TestBackend> = config.init(&device);
        ckpt.save_model_config(&config).unwrap();
        ckpt.save_best(&model).unwrap();

        let predictor = SteeringPredictor::<TestBackend>::from_checkpoint(&ckpt, device).unwrap();
        assert!(predictor.predict(&[0u8; 12], 1.0).is_err());
    }
}
