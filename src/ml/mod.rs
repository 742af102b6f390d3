// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model, optimiser and backend code lives here.
// The data layer only builds tensors; everything that runs
// them is in this layer.
//
//   model.rs      — Linear embedding, stacked encoder blocks
//                   (multi-head self-attention, feed-forward,
//                   residual + layer norm), per-position classifier
//
//   trainer.rs    — Forward, cross-entropy, backward, Adam step;
//                   validation, metrics and checkpoints per epoch
//
//   score.rs      — Token and sequence accuracy over real positions
//
//   inferencer.rs — Loads a checkpoint, sorts one sequence,
//                   extracts attention weights
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Transformer sorting model
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Accuracy bookkeeping
pub mod score;

/// Inference engine
pub mod inferencer;
