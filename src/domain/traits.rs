// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The seams between the training core and its collaborators.
//
//   DrivingSource  → where samples come from
//                    (DrivingLogLoader reads a log + raw frames)
//   LossVisualizer → what happens to the loss curves at the end
//                    (LossPlotter draws an SVG chart)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::driving_sample::DrivingSample;

// ─── DrivingSource ────────────────────────────────────────────────────────────
/// Any component that can produce labelled driving samples.
pub trait DrivingSource {
    /// Load every available sample from this source.
    fn load_all(&self) -> Result<Vec<DrivingSample>>;
}

// ─── LossVisualizer ───────────────────────────────────────────────────────────
/// Receives the loss histories once training has finished.
///
/// The trainer treats this as fire-and-forget: a returned error
/// is logged, never propagated.
pub trait LossVisualizer {
    /// `training` and `validation` hold one mean loss per epoch.
    /// `metric_type` is a label for the plotted quantity, e.g. "Losses".
    fn vis_train(
        &self,
        training:    &[f64],
        validation:  &[f64],
        epochs:      usize,
        metric_type: &str,
    ) -> Result<()>;
}
