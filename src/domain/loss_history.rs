// ============================================================
// Layer 3 - Loss History
// ============================================================
// The per-epoch mean losses collected over a training run.
// Index i of each sequence belongs to epoch i + 1.

use serde::{Deserialize, Serialize};

/// Ordered per-epoch mean losses for training and validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    pub training:   Vec<f64>,
    pub validation: Vec<f64>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one epoch's mean training and validation losses
    pub fn record(&mut self, train_loss: f64, val_loss: f64) {
        self.training.push(train_loss);
        self.validation.push(val_loss);
    }

    /// Number of completed epochs
    pub fn epochs(&self) -> usize {
        self.validation.len()
    }

    /// For each epoch, whether its validation loss undercut every earlier one.
    ///
    /// `initial_best` is the sentinel the first epoch is compared against.
    pub fn improvements(&self, initial_best: f64) -> Vec<bool> {
        let mut best = initial_best;
        self.validation
            .iter()
            .map(|&loss| {
                let improved = loss < best;
                if improved {
                    best = loss;
                }
                improved
            })
            .collect()
    }

    /// 1-based epoch with the lowest validation loss, and that loss.
    /// NaN losses are ignored.
    pub fn best_epoch(&self) -> Option<(usize, f64)> {
        self.validation
            .iter()
            .enumerate()
            .filter(|(_, loss)| !loss.is_nan())
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &loss)| (i + 1, loss))
    }
}
