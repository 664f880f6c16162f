// ============================================================
// Layer 2 - PredictUseCase
// ============================================================
// Loads the best checkpoint on the requested device and
// predicts steering for one raw frame file.

use anyhow::Result;
use std::path::Path;

use crate::application::train_use_case::ComputeDevice;
use crate::data::loader::load_frame;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::SteeringPredictor;

enum Predictor {
    Cpu(SteeringPredictor<burn::backend::NdArray>),
    Wgpu(SteeringPredictor<burn::backend::Wgpu>),
}

pub struct PredictUseCase {
    predictor: Predictor,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: &str, device: ComputeDevice) -> Result<Self> {
        let ckpt = CheckpointManager::new(checkpoint_dir)?;
        let predictor = match device {
            ComputeDevice::Cpu => Predictor::Cpu(SteeringPredictor::from_checkpoint(
                &ckpt,
                burn::backend::ndarray::NdArrayDevice::default(),
            )?),
            ComputeDevice::Wgpu => Predictor::Wgpu(SteeringPredictor::from_checkpoint(
                &ckpt,
                burn::backend::wgpu::WgpuDevice::default(),
            )?),
        };
        Ok(Self { predictor })
    }

    /// Predicted steering for the raw RGB frame at `frame_path`
    pub fn predict(&self, frame_path: &Path, speed: f32) -> Result<f32> {
        let frame = load_frame(frame_path)?;
        let steering = match &self.predictor {
            Predictor::Cpu(p)  => p.predict(&frame, speed)?,
            Predictor::Wgpu(p) => p.predict(&frame, speed)?,
        };
        tracing::debug!("'{}' @ speed {} -> steering {}", frame_path.display(), speed, steering);
        Ok(steering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::domain::driving_sample::FRAME_LEN;
    use crate::ml::model::{Driver, DriverConfig};

    #[test]
    fn test_predict_on_cpu() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let config = DriverConfig::new();
        let model: Driver<burn::backend::NdArray> = config.init(&Default::default());
        ckpt.save_model_config(&config).unwrap();
        ckpt.save_best(&model).unwrap();

        let frame_path = tmp.path().join("frame.rgb");
        fs::write(&frame_path, vec![90u8; FRAME_LEN]).unwrap();

        let use_case = PredictUseCase::new(&tmp.path().display().to_string(), ComputeDevice::Cpu).unwrap();
        assert!(use_case.predict(&frame_path, 8.0).unwrap().is_finite());
        assert!(use_case.predict(&tmp.path().join("missing.rgb"), 8.0).is_err());
    }
}
