// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only: each use case wires the data,
// ml and infra layers together for one CLI command.

// The training workflow
pub mod train_use_case;

// Single-frame steering prediction from the best checkpoint
pub mod predict_use_case;
