// ============================================================
// Layer 2 — Sort Use Case
// ============================================================
// Loads the latest checkpoint and either
//   - sorts one user sequence, or
//   - scores the model on freshly generated sequences.

use anyhow::Result;

use crate::data::generator::SequenceGenerator;
use crate::domain::sequence::DigitSequence;
use crate::domain::traits::{SampleSource, Sorter};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::{InferBackend, Inferencer, Prediction};

pub struct SortUseCase {
    inferencer: Inferencer<InferBackend>,
}

impl SortUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt, Default::default())?;
        Ok(Self { inferencer })
    }

    pub fn predict(&self, input: &DigitSequence) -> Result<Prediction> {
        self.inferencer.predict(input)
    }

    /// Sort `samples` random sequences of up to the trained length.
    pub fn evaluate_random(&self, samples: usize, seed: Option<u64>) -> Result<SortingAccuracy> {
        let max_len = self.inferencer.max_len();
        let mut generator = match seed {
            Some(seed) => SequenceGenerator::with_seed(max_len, samples, seed),
            None       => SequenceGenerator::new(max_len, samples),
        };
        let inputs: Vec<DigitSequence> = generator
            .next_samples()
            .into_iter()
            .take(samples)
            .map(|s| s.input)
            .collect();
        sorting_accuracy(self, &inputs)
    }
}

impl Sorter for SortUseCase {
    fn sort(&self, input: &DigitSequence) -> Result<DigitSequence> {
        Ok(self.predict(input)?.output)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortingAccuracy {
    pub correct: usize,
    pub total:   usize,
    /// First few inputs the sorter got wrong, with its answers
    pub failures: Vec<(DigitSequence, DigitSequence)>,
}

impl SortingAccuracy {
    pub fn fraction(&self) -> f64 {
        if self.total > 0 { self.correct as f64 / self.total as f64 } else { 0.0 }
    }
}

const MAX_REPORTED_FAILURES: usize = 5;

/// Run any Sorter over `inputs` and count exact sorts.
pub fn sorting_accuracy<S: Sorter + ?Sized>(
    sorter: &S,
    inputs: &[DigitSequence],
) -> Result<SortingAccuracy> {
    let mut acc = SortingAccuracy::default();
    for input in inputs {
        let output = sorter.sort(input)?;
        acc.total += 1;
        if output == input.sorted() {
            acc.correct += 1;
        } else if acc.failures.len() < MAX_REPORTED_FAILURES {
            acc.failures.push((input.clone(), output));
        }
    }
    Ok(acc)
}
