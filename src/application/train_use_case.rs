// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Validate hyperparameters       (Layer 5 - ml)
//   Step 2: Build the sequence generator   (Layer 4 - data)
//   Step 3: Draw the positional table      (Layer 4 - data)
//   Step 4: Freeze a validation set        (Layer 4 - data)
//   Step 5: Save config + table            (Layer 6 - infra)
//   Step 6: Run training loop              (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::data::{dataset::SortDataset, generator::SequenceGenerator};
use crate::domain::sequence::ALPHABET;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::model::SortTransformerConfig;
use crate::ml::trainer::{run_training, TrainReport, TrainSinks};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved to train_config.json so inference can rebuild the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub checkpoint_dir:  String,
    /// Longest generated sequence; also the longest the model accepts later
    pub max_len:         usize,
    pub batch_size:      usize,
    pub epochs:          usize,
    /// Fresh batches drawn per epoch
    pub steps_per_epoch: usize,
    /// Batches frozen into the validation set
    pub val_batches:     usize,
    pub lr:              f64,
    pub hidden:          usize,
    pub heads:           usize,
    pub blocks:          usize,
    pub d_ff:            usize,
    pub dropout:         f64,
    /// Add the fixed random positional table to every input
    pub positional:      bool,
    pub seed:            Option<u64>,
    /// Stop once validation sequence accuracy reaches this fraction
    pub target_accuracy: Option<f64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir:  "checkpoints".to_string(),
            max_len:         10,
            batch_size:      64,
            epochs:          20,
            steps_per_epoch: 200,
            val_batches:     8,
            lr:              1e-3,
            hidden:          64,
            heads:           4,
            blocks:          2,
            d_ff:            128,
            dropout:         0.1,
            positional:      false,
            seed:            None,
            target_accuracy: None,
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self) -> SortTransformerConfig {
        self.model_config_with_dropout(self.dropout)
    }

    pub fn model_config_with_dropout(&self, dropout: f64) -> SortTransformerConfig {
        SortTransformerConfig::new(ALPHABET, self.hidden, self.heads, self.blocks, self.d_ff, dropout)
    }

    /// Everything that would otherwise fail deep inside the run.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_len > 0, "max_len must be at least 1");
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(self.epochs > 0, "epochs must be at least 1");
        ensure!(self.steps_per_epoch > 0, "steps_per_epoch must be at least 1");
        ensure!(self.val_batches > 0, "val_batches must be at least 1");
        ensure!(self.lr > 0.0 && self.lr.is_finite(), "learning rate must be positive");
        if let Some(target) = self.target_accuracy {
            ensure!((0.0..=1.0).contains(&target), "target accuracy {} is not in [0, 1]", target);
        }
        self.model_config().validate()
    }

    pub fn generator(&self) -> SequenceGenerator {
        match self.seed {
            Some(seed) => SequenceGenerator::with_seed(self.max_len, self.batch_size, seed),
            None       => SequenceGenerator::new(self.max_len, self.batch_size),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2-3: Generator and its fixed positional table ────────────────
        let mut generator = cfg.generator();
        let positional    = cfg.positional.then(|| generator.positional_table());
        tracing::info!(
            "Generating sequences of length 1..={} in batches of {} (positional table: {})",
            cfg.max_len, cfg.batch_size, positional.is_some(),
        );

        // ── Step 4: Validation set ────────────────────────────────────────────
        let validation = SortDataset::draw(&mut generator, cfg.val_batches);
        tracing::info!("Frozen {} validation samples", validation.sample_count());

        // ── Step 5: Save config (and table) for inference ─────────────────────
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir);
        checkpoints.save_config(cfg)?;
        if let Some(table) = &positional {
            checkpoints.save_positional(table)?;
        }
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(
            cfg,
            generator,
            positional,
            &validation,
            TrainSinks { checkpoints: &checkpoints, metrics: &metrics },
        )
    }
}
