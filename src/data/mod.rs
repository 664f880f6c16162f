// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// From a driving log on disk to tensor batches on the device:
//
//   driving_log.csv + raw frames
//       │
//       ▼
//   DrivingLogLoader  → parses rows, reads frame bytes
//       │
//       ▼
//   split_train_val   → seeded shuffle, train / validation
//       │
//       ▼
//   DrivingDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   DrivingBatcher    → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads a driving log and its raw RGB frames
pub mod loader;

/// Implements Burn's Dataset trait for driving samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
