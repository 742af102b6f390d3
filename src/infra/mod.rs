// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   checkpoint.rs       — Model weights via Burn's CompactRecorder,
//                         plus train_config.json, latest_epoch.json
//                         and the positional table as JSON.
//
//   metrics.rs          — One CSV row of loss/accuracy per epoch.
//
//   attention_export.rs — Attention weights as long-format CSV.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Attention weights CSV writer
pub mod attention_export;
