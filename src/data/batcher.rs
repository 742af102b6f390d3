// ============================================================
// Layer 4 — Sort Batcher
// ============================================================
// Converts a Vec<SortSample> into tensors for the model.
//
// How batching works here:
//   Input:  N samples of varying length (1..=max_len)
//   Output: SortBatch with
//             inputs  [N, L, 10]  one-hot (+ positional rows)
//             targets [N, L]      sorted digits
//           where L is the longest sample in THIS batch.
//
// Shorter samples are right-padded with zeros on both sides, so
// a padded slot reads as digit 0 in the input and the target.
//
//   samples: [3,1]   [2,2,0,1]
//   inputs:  [3,1,0,0] [2,2,0,1]   (then one-hot)
//   targets: [1,3,0,0] [0,1,2,2]
//
// Reference: Burn Book §4 (Batcher)

use burn::{prelude::*, tensor::TensorData};

use crate::data::positional::PositionalTable;
use crate::domain::sequence::{SortSample, ALPHABET};
use crate::domain::traits::SampleSource;

// ─── SortBatch ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct SortBatch<B: Backend> {
    /// Encoded inputs — shape: [batch_size, pad_len, ALPHABET]
    pub inputs: Tensor<B, 3>,

    /// Sorted digits — shape: [batch_size, pad_len]
    pub targets: Tensor<B, 2, Int>,

    /// Unpadded length of every sample, in batch order
    pub lengths: Vec<usize>,
}

impl<B: Backend> SortBatch<B> {
    pub fn pad_len(&self) -> usize {
        self.targets.dims()[1]
    }
}

// ─── SortBatcher ──────────────────────────────────────────────────────────────
/// Holds the target device and, for the positional variant,
/// the fixed table added to every encoded row.
#[derive(Clone, Debug)]
pub struct SortBatcher<B: Backend> {
    pub device: B::Device,
    positional: Option<PositionalTable>,
}

impl<B: Backend> SortBatcher<B> {
    pub fn new(device: B::Device, positional: Option<PositionalTable>) -> Self {
        Self { device, positional }
    }

    /// Pad, encode and stack `samples` into one batch.
    pub fn batch(&self, samples: &[SortSample]) -> SortBatch<B> {
        let batch_size = samples.len();
        // Never build a zero-width tensor, even for an empty batch
        let pad_len    = samples.iter().map(SortSample::len).max().unwrap_or(0).max(1);

        let input_flat  = encode_inputs(samples, pad_len, self.positional.as_ref());
        let target_flat = encode_targets(samples, pad_len);

        let inputs = Tensor::<B, 3>::from_data(
            TensorData::new(input_flat, [batch_size, pad_len, ALPHABET]),
            &self.device,
        );
        let targets = Tensor::<B, 2, Int>::from_data(
            TensorData::new(target_flat, [batch_size, pad_len]),
            &self.device,
        );

        SortBatch {
            inputs,
            targets,
            lengths: samples.iter().map(SortSample::len).collect(),
        }
    }
}

/// Row-major `[N, pad_len, ALPHABET]` encoding of the padded inputs.
/// Positions past the end of the table get no positional offset.
pub fn encode_inputs(
    samples:    &[SortSample],
    pad_len:    usize,
    positional: Option<&PositionalTable>,
) -> Vec<f32> {
    let mut flat = vec![0.0f32; samples.len() * pad_len * ALPHABET];
    for (i, sample) in samples.iter().enumerate() {
        for (pos, digit) in sample.input.padded(pad_len).into_iter().enumerate() {
            let base = (i * pad_len + pos) * ALPHABET;
            flat[base + digit as usize] = 1.0;
            if let Some(row) = positional.and_then(|t| t.row(pos)) {
                for (slot, offset) in flat[base..base + ALPHABET].iter_mut().zip(row) {
                    *slot += offset;
                }
            }
        }
    }
    flat
}

/// Row-major `[N, pad_len]` class indices of the padded targets.
pub fn encode_targets(samples: &[SortSample], pad_len: usize) -> Vec<i64> {
    samples
        .iter()
        .flat_map(|s| s.target.padded(pad_len).into_iter().map(i64::from))
        .collect()
}

// ─── BatchStream ──────────────────────────────────────────────────────────────
/// The unbounded (X, y) stream fed to the training loop.
/// The positional table inside the batcher is captured once at
/// construction and reused for every batch.
pub struct BatchStream<B: Backend, S: SampleSource> {
    source:  S,
    batcher: SortBatcher<B>,
}

impl<B: Backend, S: SampleSource> BatchStream<B, S> {
    pub fn new(source: S, batcher: SortBatcher<B>) -> Self {
        Self { source, batcher }
    }
}

impl<B: Backend, S: SampleSource> Iterator for BatchStream<B, S> {
    type Item = SortBatch<B>;

    fn next(&mut self) -> Option<Self::Item> {
        let samples = self.source.next_samples();
        Some(self.batcher.batch(&samples))
    }
}
