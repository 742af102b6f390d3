// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands: `train`, `sort`, `eval`, `attention`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the sorting transformer on generated sequences
    Train(TrainArgs),

    /// Sort one digit sequence with a trained checkpoint
    Sort(SortArgs),

    /// Score a trained checkpoint on fresh random sequences
    Eval(EvalArgs),

    /// Show the attention weights of one block for a sequence
    Attention(AttentionArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory to save model checkpoints, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Longest generated sequence; lengths are drawn from 1..=max_len
    #[arg(long, default_value_t = 10)]
    pub max_len: usize,

    /// Sequences per batch
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Fresh batches drawn in every epoch
    #[arg(long, default_value_t = 200)]
    pub steps_per_epoch: usize,

    /// Batches frozen into the validation set
    #[arg(long, default_value_t = 8)]
    pub val_batches: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Hidden width of the transformer (d_model); must divide by --heads
    #[arg(long, default_value_t = 64)]
    pub hidden: usize,

    /// Number of attention heads per block
    #[arg(long, default_value_t = 4)]
    pub heads: usize,

    /// Number of stacked transformer blocks
    #[arg(long, default_value_t = 2)]
    pub blocks: usize,

    /// Inner width of the feed-forward sublayer
    #[arg(long, default_value_t = 128)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Add a fixed random vector per position to the one-hot input
    #[arg(long)]
    pub positional: bool,

    /// Seed the sequence generator for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop early once validation sequence accuracy reaches this fraction
    #[arg(long)]
    pub target_accuracy: Option<f64>,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            checkpoint_dir:  a.checkpoint_dir,
            max_len:         a.max_len,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            steps_per_epoch: a.steps_per_epoch,
            val_batches:     a.val_batches,
            lr:              a.lr,
            hidden:          a.hidden,
            heads:           a.heads,
            blocks:          a.blocks,
            d_ff:            a.d_ff,
            dropout:         a.dropout,
            positional:      a.positional,
            seed:            a.seed,
            target_accuracy: a.target_accuracy,
        }
    }
}

#[derive(Args, Debug)]
pub struct SortArgs {
    /// Digits to sort, e.g. "3 1 4 1 5" or "31415"
    #[arg(long)]
    pub digits: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// How many random sequences to sort
    #[arg(long, default_value_t = 1000)]
    pub samples: usize,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

#[derive(Args, Debug)]
pub struct AttentionArgs {
    /// Digits to run through the model
    #[arg(long)]
    pub digits: String,

    /// Which transformer block to inspect (0-based)
    #[arg(long, default_value_t = 0)]
    pub block: usize,

    /// Show a single head instead of the mean over heads
    #[arg(long)]
    pub head: Option<usize>,

    /// Also write every weight to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
