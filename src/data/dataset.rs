use burn::data::dataset::Dataset;

use crate::domain::driving_sample::DrivingSample;

/// In-memory driving samples exposed through Burn's Dataset trait.
pub struct DrivingDataset {
    samples: Vec<DrivingSample>,
}

impl DrivingDataset {
    pub fn new(samples: Vec<DrivingSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<DrivingSample> for DrivingDataset {
    fn get(&self, index: usize) -> Option<DrivingSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
