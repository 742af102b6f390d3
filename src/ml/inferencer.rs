// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the trained model from a checkpoint and runs it on
// single user-supplied sequences. Inputs are encoded exactly
// as during training: one-hot, plus the saved positional table
// when the run used one.

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::data::batcher::SortBatcher;
use crate::domain::sequence::{DigitSequence, SortSample, ALPHABET};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::SortTransformer;

pub type InferBackend = burn::backend::Wgpu;

/// The model's answer for one input sequence.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub input:      DigitSequence,
    pub output:     DigitSequence,
    /// Probability the model assigned to its chosen digit, per position
    pub confidence: Vec<f32>,
}

impl Prediction {
    pub fn mean_confidence(&self) -> f32 {
        if self.confidence.is_empty() {
            return 0.0;
        }
        self.confidence.iter().sum::<f32>() / self.confidence.len() as f32
    }

    pub fn is_correct(&self) -> bool {
        self.output == self.input.sorted()
    }
}

/// Attention weights of one block for one input: `heads x len x len`,
/// row = querying position, column = attended position.
#[derive(Debug, Clone)]
pub struct AttentionMap {
    pub block:   usize,
    pub heads:   usize,
    pub len:     usize,
    pub weights: Vec<f32>,
}

impl AttentionMap {
    pub fn weight(&self, head: usize, query: usize, key: usize) -> f32 {
        self.weights[(head * self.len + query) * self.len + key]
    }

    pub fn row(&self, head: usize, query: usize) -> &[f32] {
        let start = (head * self.len + query) * self.len;
        &self.weights[start..start + self.len]
    }

    /// Average over heads — shape `len x len`, row-major.
    pub fn head_mean(&self) -> Vec<f32> {
        let cells = self.len * self.len;
        let mut mean = vec![0.0f32; cells];
        for head in 0..self.heads {
            for (m, w) in mean.iter_mut().zip(&self.weights[head * cells..(head + 1) * cells]) {
                *m += w;
            }
        }
        let heads = self.heads.max(1) as f32;
        mean.iter_mut().for_each(|m| *m /= heads);
        mean
    }
}

pub struct Inferencer<B: Backend> {
    model:   SortTransformer<B>,
    batcher: SortBatcher<B>,
    max_len: usize,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint(ckpt: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg = ckpt.load_config()?;
        // Dropout is an identity at inference; build without it
        let model_cfg = cfg.model_config_with_dropout(0.0);
        model_cfg.validate()?;

        let model: SortTransformer<B> = model_cfg.init(&device);
        let model = ckpt.load_model(model, &device)?;

        let positional = if cfg.positional {
            Some(ckpt.load_positional(cfg.max_len)?)
        } else {
            None
        };
        tracing::info!(
            "Model loaded from checkpoint ({} blocks, positional table: {})",
            model.block_count(),
            positional.is_some(),
        );

        Ok(Self::new(model, SortBatcher::new(device, positional), cfg.max_len))
    }

    pub fn new(model: SortTransformer<B>, batcher: SortBatcher<B>, max_len: usize) -> Self {
        Self { model, batcher, max_len }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn predict(&self, input: &DigitSequence) -> Result<Prediction> {
        self.check_input(input)?;
        let batch = self.batcher.batch(&[SortSample::from_input(input.clone())]);

        let predicted: Vec<i64> = self.model
            .predict(batch.inputs.clone())
            .into_data()
            .iter::<i64>()
            .take(input.len())
            .collect();
        let probs: Vec<f32> = self.model
            .probabilities(batch.inputs)
            .into_data()
            .iter::<f32>()
            .collect();

        // Confidence is the probability of the chosen digit at each position
        let mut digits     = Vec::with_capacity(input.len());
        let mut confidence = Vec::with_capacity(input.len());
        for (pos, &digit) in predicted.iter().enumerate() {
            let digit = u8::try_from(digit)?;
            confidence.push(probs[pos * ALPHABET + digit as usize]);
            digits.push(digit);
        }

        let output = DigitSequence::new(digits)?;
        tracing::debug!("{} -> {}", input, output);
        Ok(Prediction { input: input.clone(), output, confidence })
    }

    pub fn attention(&self, input: &DigitSequence, block: usize) -> Result<AttentionMap> {
        self.check_input(input)?;
        ensure!(
            block < self.model.block_count(),
            "block {} does not exist; the model has {} block(s)",
            block, self.model.block_count(),
        );
        let batch = self.batcher.batch(&[SortSample::from_input(input.clone())]);

        let mut out = self.model.forward_with_attention(batch.inputs);
        let weights = out.attention.swap_remove(block);
        let [_, heads, len, _] = weights.dims();

        Ok(AttentionMap {
            block,
            heads,
            len,
            weights: weights.into_data().iter::<f32>().collect(),
        })
    }

    fn check_input(&self, input: &DigitSequence) -> Result<()> {
        ensure!(!input.is_empty(), "cannot sort an empty sequence");
        ensure!(
            input.len() <= self.max_len,
            "sequence has {} digits but the model was trained on at most {}",
            input.len(), self.max_len,
        );
        Ok(())
    }
}
