// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs and traits describing the driving data
// and the training run. No Burn types and no file I/O here.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A driving-log row and a loaded (frame, speed, steering) sample
pub mod driving_sample;

// Per-epoch training / validation losses
pub mod loss_history;

// Core abstractions (traits) that other layers implement
pub mod traits;
