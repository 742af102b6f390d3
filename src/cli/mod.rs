// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and prints results.
// All real work is delegated to Layer 2 (application).
//
//   1. `train`     — trains the sorting transformer
//   2. `sort`      — sorts one sequence with a checkpoint
//   3. `eval`      — scores a checkpoint on random sequences
//   4. `attention` — prints an attention heatmap
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;
pub mod heatmap;

use anyhow::Result;
use clap::Parser;
use commands::{AttentionArgs, Commands, EvalArgs, SortArgs, TrainArgs};

use crate::domain::sequence::DigitSequence;

#[derive(Parser, Debug)]
#[command(
    name = "attention-sort",
    version,
    about = "Train a small transformer to sort digit sequences, then inspect what its attention learned."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case. Computes nothing itself.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Sort(args)      => run_sort(args),
            Commands::Eval(args)      => run_eval(args),
            Commands::Attention(args) => run_attention(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training, checkpoints in: {}", args.checkpoint_dir);

    let use_case = TrainUseCase::new(args.into());
    let report   = use_case.execute()?;

    match report.epochs.last() {
        Some(last) => println!(
            "Training complete after {} epoch(s): val_loss={:.4}, token_acc={:.1}%, seq_acc={:.1}%{}",
            last.epoch,
            last.val_loss,
            last.token_acc * 100.0,
            last.seq_acc * 100.0,
            if report.stopped_early { " (stopped early)" } else { "" },
        ),
        None => println!("Training finished without completing an epoch."),
    }
    if let Some(best) = report.best_epoch {
        println!("Best validation loss at epoch {best}.");
    }
    Ok(())
}

fn run_sort(args: SortArgs) -> Result<()> {
    use crate::application::sort_use_case::SortUseCase;

    let input    = DigitSequence::parse(&args.digits)?;
    let use_case = SortUseCase::new(&args.checkpoint_dir)?;
    let pred     = use_case.predict(&input)?;

    println!("\nInput:      {}", pred.input);
    println!("Model:      {}", pred.output);
    println!("Expected:   {}", pred.input.sorted());
    println!(
        "Confidence: {:.1}%  ({})",
        pred.mean_confidence() * 100.0,
        if pred.is_correct() { "correct" } else { "wrong" },
    );
    Ok(())
}

fn run_eval(args: EvalArgs) -> Result<()> {
    use crate::application::sort_use_case::SortUseCase;

    let use_case = SortUseCase::new(&args.checkpoint_dir)?;
    let acc      = use_case.evaluate_random(args.samples, args.seed)?;

    println!(
        "Sorted {}/{} random sequences exactly ({:.1}%)",
        acc.correct, acc.total, acc.fraction() * 100.0,
    );
    for (input, output) in &acc.failures {
        println!("  {input} -> {output}");
    }
    Ok(())
}

fn run_attention(args: AttentionArgs) -> Result<()> {
    use crate::application::attention_use_case::AttentionUseCase;

    let input    = DigitSequence::parse(&args.digits)?;
    let use_case = AttentionUseCase::new(&args.checkpoint_dir)?;
    let map      = use_case.inspect(&input, args.block, args.csv.as_deref())?;

    match args.head {
        Some(h) => println!("\nBlock {}, head {}:", map.block, h),
        None    => println!("\nBlock {}, mean of {} heads:", map.block, map.heads),
    }
    print!("{}", heatmap::render(&input, &map, args.head)?);
    Ok(())
}
