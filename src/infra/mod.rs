// ============================================================
// Layer 6 - Infrastructure
// ============================================================
// Everything that touches the file system on behalf of the
// training core.

/// Best-model checkpoint and config persistence
pub mod checkpoint;

/// Per-epoch loss CSV
pub mod metrics;

/// Loss-curve chart (the training visualizer)
pub mod plot;
