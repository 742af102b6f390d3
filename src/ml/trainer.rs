// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Each epoch:
//   1. steps_per_epoch fresh batches from the BatchStream
//      (forward → cross-entropy → backward → Adam step)
//   2. validation on the frozen SortDataset with model.valid()
//   3. one CSV row + one checkpoint
//
// The loop is generic over the autodiff backend so the same
// code runs on Autodiff<Wgpu> from the CLI and Autodiff<NdArray>
// in tests.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{BatchStream, SortBatcher},
    dataset::SortDataset,
    positional::PositionalTable,
};
use crate::domain::traits::SampleSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::model::SortTransformer;
use crate::ml::score::SortScore;

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// What a finished run looked like.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs:        Vec<EpochMetrics>,
    /// Epoch with the lowest validation loss
    pub best_epoch:    Option<usize>,
    pub stopped_early: bool,
}

/// Where per-epoch results go.
pub struct TrainSinks<'a> {
    pub checkpoints: &'a CheckpointManager,
    pub metrics:     &'a MetricsLogger,
}

pub fn run_training<S: SampleSource>(
    cfg:        &TrainConfig,
    source:     S,
    positional: Option<PositionalTable>,
    validation: &SortDataset,
    sinks:      TrainSinks<'_>,
) -> Result<TrainReport> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend, S>(cfg, source, positional, validation, sinks, device)
}

pub fn train_loop<B: AutodiffBackend, S: SampleSource>(
    cfg:        &TrainConfig,
    source:     S,
    positional: Option<PositionalTable>,
    validation: &SortDataset,
    sinks:      TrainSinks<'_>,
    device:     B::Device,
) -> Result<TrainReport> {

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = cfg.model_config();
    model_cfg.validate()?;
    let mut model: SortTransformer<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} blocks, hidden={}, heads={}, {} parameters",
        cfg.blocks, cfg.hidden, cfg.heads, model.num_params(),
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new()
        .with_epsilon(1e-8)
        .init::<B, SortTransformer<B>>();

    // ── Data: unbounded training stream, frozen validation set ────────────────
    let mut stream  = BatchStream::new(source, SortBatcher::<B>::new(device.clone(), positional.clone()));
    let val_batcher = SortBatcher::<B::InnerBackend>::new(device, positional);

    let mut report = TrainReport { epochs: Vec::new(), best_epoch: None, stopped_early: false };
    let mut best_val_loss = f64::INFINITY;

    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_steps    = 0usize;

        for batch in stream.by_ref().take(cfg.steps_per_epoch) {
            let (loss, _) = model.forward_loss(batch.inputs, batch.targets);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_steps    += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_steps > 0 {
            train_loss_sum / train_steps as f64
        } else { f64::NAN };

        // ── Validation phase (InnerBackend, dropout off) ──────────────────────
        let score = evaluate(&model.valid(), &val_batcher, validation, cfg.batch_size);

        let metrics = EpochMetrics::new(
            epoch,
            avg_train_loss,
            score.mean_loss(),
            score.token_accuracy(),
            score.sequence_accuracy(),
        );
        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | token_acc={:.1}% | seq_acc={:.1}%",
            epoch, cfg.epochs, metrics.train_loss, metrics.val_loss,
            metrics.token_acc * 100.0, metrics.seq_acc * 100.0,
        );

        if metrics.is_improvement(best_val_loss) {
            best_val_loss     = metrics.val_loss;
            report.best_epoch = Some(epoch);
        }

        sinks.metrics.log(&metrics)?;
        sinks.checkpoints.save_model(&model, epoch)?;

        let reached_target = cfg
            .target_accuracy
            .is_some_and(|target| metrics.seq_acc >= target);
        report.epochs.push(metrics);

        if reached_target {
            tracing::info!("Target sequence accuracy reached after epoch {}", epoch);
            report.stopped_early = epoch < cfg.epochs;
            break;
        }
    }

    tracing::info!("Training complete!");
    Ok(report)
}

/// Score `model` on every sample of `dataset`, `batch_size` at a time.
pub fn evaluate<B: Backend>(
    model:      &SortTransformer<B>,
    batcher:    &SortBatcher<B>,
    dataset:    &SortDataset,
    batch_size: usize,
) -> SortScore {
    let mut score = SortScore::default();

    for chunk in dataset.chunks(batch_size) {
        let batch   = batcher.batch(chunk);
        let pad_len = batch.pad_len();
        let [n, len] = batch.targets.dims();

        let (loss, logits) = model.forward_loss(batch.inputs, batch.targets.clone());
        let predicted: Vec<i64> = logits
            .argmax(2)
            .reshape([n, len])
            .into_data()
            .iter::<i64>()
            .collect();
        let targets: Vec<i64> = batch.targets.into_data().iter::<i64>().collect();

        score.add_batch(
            loss.into_scalar().elem::<f64>(),
            &predicted,
            &targets,
            &batch.lengths,
            pad_len,
        );
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generator::SequenceGenerator;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    type TestBackend = Autodiff<NdArray>;

    fn tiny_config(epochs: usize) -> TrainConfig {
        TrainConfig {
            max_len:         4,
            batch_size:      32,
            epochs,
            steps_per_epoch: 40,
            val_batches:     2,
            lr:              1e-2,
            hidden:          32,
            heads:           2,
            blocks:          1,
            d_ff:            64,
            dropout:         0.0,
            positional:      true,
            seed:            Some(17),
            ..TrainConfig::default()
        }
    }

    fn run(name: &str, cfg: &TrainConfig) -> TrainReport {
        let dir = std::env::temp_dir()
            .join(format!("attention-sort-train-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let checkpoints = CheckpointManager::new(&dir);
        let metrics     = MetricsLogger::new(&dir).unwrap();

        let mut gen    = SequenceGenerator::with_seed(cfg.max_len, cfg.batch_size, 17);
        let positional = Some(gen.positional_table());
        let validation = SortDataset::draw(&mut gen, cfg.val_batches);

        let report = train_loop::<TestBackend, _>(
            cfg,
            gen,
            positional,
            &validation,
            TrainSinks { checkpoints: &checkpoints, metrics: &metrics },
            Default::default(),
        )
        .unwrap();

        assert!(dir.join("latest_epoch.json").exists());
        let _ = fs::remove_dir_all(&dir);
        report
    }

    #[test]
    fn test_training_reduces_loss() {
        let report = run("reduces-loss", &tiny_config(3));
        assert_eq!(report.epochs.len(), 3);

        let first = &report.epochs[0];
        let last  = &report.epochs[2];
        assert!(first.train_loss.is_finite() && last.train_loss.is_finite());
        assert!(
            last.train_loss < first.train_loss,
            "train loss went from {} to {}", first.train_loss, last.train_loss,
        );
        assert!(last.token_acc > 0.1);
        assert!(report.best_epoch.is_some());
    }

    #[test]
    fn test_zero_target_stops_after_first_epoch() {
        let cfg = TrainConfig { target_accuracy: Some(0.0), steps_per_epoch: 2, ..tiny_config(5) };
        let report = run("early-stop", &cfg);
        assert_eq!(report.epochs.len(), 1);
        assert!(report.stopped_early);
    }

    #[test]
    fn test_invalid_model_config_is_rejected() {
        let cfg = TrainConfig { hidden: 30, heads: 4, ..tiny_config(1) };
        let dir = std::env::temp_dir()
            .join(format!("attention-sort-train-invalid-{}", std::process::id()));
        let checkpoints = CheckpointManager::new(&dir);
        let metrics     = MetricsLogger::new(&dir).unwrap();
        let mut gen     = SequenceGenerator::with_seed(4, 4, 1);
        let validation  = SortDataset::draw(&mut gen, 1);

        let result = train_loop::<TestBackend, _>(
            &cfg, gen, None, &validation,
            TrainSinks { checkpoints: &checkpoints, metrics: &metrics },
            Default::default(),
        );
        assert!(result.is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_evaluate_counts_every_sample() {
        let device = Default::default();
        let model: SortTransformer<NdArray> = tiny_config(1).model_config().init(&device);
        let batcher = SortBatcher::<NdArray>::new(device, None);
        let mut gen = SequenceGenerator::with_seed(4, 10, 2);
        let dataset = SortDataset::draw(&mut gen, 1);

        let score = evaluate(&model, &batcher, &dataset, 4);
        assert_eq!(score.total_sequences, 10);
        assert_eq!(score.batches, 3);
        assert!(score.mean_loss().is_finite());
    }
}
