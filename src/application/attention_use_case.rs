// ============================================================
// Layer 2 — Attention Use Case
// ============================================================
// Loads the latest checkpoint, runs one sequence through it and
// returns the attention weights of a chosen block, optionally
// writing them to CSV for plotting elsewhere.

use anyhow::Result;
use std::path::Path;

use crate::domain::sequence::DigitSequence;
use crate::infra::{attention_export::write_attention_csv, checkpoint::CheckpointManager};
use crate::ml::inferencer::{AttentionMap, InferBackend, Inferencer};

pub struct AttentionUseCase {
    inferencer: Inferencer<InferBackend>,
}

impl AttentionUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt, Default::default())?;
        Ok(Self { inferencer })
    }

    pub fn inspect(
        &self,
        input: &DigitSequence,
        block: usize,
        csv:   Option<&Path>,
    ) -> Result<AttentionMap> {
        let map = self.inferencer.attention(input, block)?;
        if let Some(path) = csv {
            write_attention_csv(path, input, &map)?;
            tracing::info!("Wrote attention weights to '{}'", path.display());
        }
        Ok(map)
    }
}
