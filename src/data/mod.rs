// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between "random numbers" and "tensors":
//
//   SequenceGenerator  → random digit sequences + sorted targets
//       │
//       ▼
//   PositionalTable    → fixed per-position offsets (second variant)
//       │
//       ▼
//   SortBatcher        → pads, one-hot encodes, builds tensors
//       │
//       ▼
//   BatchStream        → unbounded iterator of batches for training
//
//   SortDataset        → a frozen draw used for validation
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Random sequence source
pub mod generator;

/// Fixed random positional vectors
pub mod positional;

/// Padding, one-hot encoding and the batch stream
pub mod batcher;

/// Implements Burn's Dataset trait for a fixed validation set
pub mod dataset;
