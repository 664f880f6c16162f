// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
//   model.rs      - the steering CNN (conv stack + speed-aware head)
//   trainer.rs    - epoch loop: Adam updates, validation,
//                   best-model checkpointing, loss curves
//   inferencer.rs - reload the best checkpoint, predict one frame
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Bojarski et al. (2016) End to End Learning for Self-Driving Cars

/// Steering CNN architecture
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Inference from the best checkpoint
pub mod inferencer;
