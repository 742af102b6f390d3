// ============================================================
// Layer 4 — Sequence Generator
// ============================================================
// Produces an endless supply of random digit sequences and
// their sorted targets. There is no dataset on disk: every
// batch is drawn fresh and thrown away after one step.
//
//   length ~ Uniform{1..=max_len}
//   digit  ~ Uniform{0..=9}
//
// A generator is restartable by construction (build a new one)
// but not deterministic unless it was created with a seed.
//
// Reference: rand crate documentation (SeedableRng, Rng)

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::positional::PositionalTable;
use crate::domain::sequence::{DigitSequence, SortSample, ALPHABET};
use crate::domain::traits::SampleSource;

pub struct SequenceGenerator {
    /// Longest sequence that will ever be produced
    max_len:    usize,
    /// Samples per call to next_samples()
    batch_size: usize,
    rng:        StdRng,
}

impl SequenceGenerator {
    /// Entropy-seeded generator: a different stream on every run.
    pub fn new(max_len: usize, batch_size: usize) -> Self {
        Self::from_rng(max_len, batch_size, StdRng::from_entropy())
    }

    /// Seeded generator: the same stream for the same seed.
    pub fn with_seed(max_len: usize, batch_size: usize, seed: u64) -> Self {
        Self::from_rng(max_len, batch_size, StdRng::seed_from_u64(seed))
    }

    fn from_rng(max_len: usize, batch_size: usize, rng: StdRng) -> Self {
        // Zero would make gen_range(1..=0) panic
        let max_len    = max_len.max(1);
        let batch_size = batch_size.max(1);
        Self { max_len, batch_size, rng }
    }

    /// One random sequence with length in `1..=max_len`.
    pub fn random_sequence(&mut self) -> DigitSequence {
        let len = self.rng.gen_range(1..=self.max_len);
        let digits: Vec<u8> = (0..len)
            .map(|_| self.rng.gen_range(0..ALPHABET as u8))
            .collect();
        DigitSequence::new_unchecked(digits)
    }

    /// Draw the fixed positional table for this generator's lifetime.
    /// Called once; the same table is then used for every batch.
    pub fn positional_table(&mut self) -> PositionalTable {
        PositionalTable::random(self.max_len, &mut self.rng)
    }
}

impl SampleSource for SequenceGenerator {
    fn next_samples(&mut self) -> Vec<SortSample> {
        (0..self.batch_size)
            .map(|_| SortSample::from_input(self.random_sequence()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_within_bounds() {
        let mut gen = SequenceGenerator::with_seed(6, 64, 1);
        for _ in 0..20 {
            for sample in gen.next_samples() {
                assert!(sample.len() >= 1 && sample.len() <= 6);
            }
        }
    }

    #[test]
    fn test_all_lengths_eventually_appear() {
        let mut gen  = SequenceGenerator::with_seed(5, 200, 7);
        let mut seen = [false; 6];
        for sample in gen.next_samples() {
            seen[sample.len()] = true;
        }
        assert!(seen[1..].iter().all(|&s| s));
    }

    #[test]
    fn test_batch_size_and_targets() {
        let mut gen     = SequenceGenerator::with_seed(8, 32, 3);
        let samples     = gen.next_samples();
        assert_eq!(samples.len(), 32);
        for s in &samples {
            assert!(s.input.digits().iter().all(|&d| d < 10));
            assert_eq!(s.target, s.input.sorted());
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SequenceGenerator::with_seed(10, 16, 42);
        let mut b = SequenceGenerator::with_seed(10, 16, 42);
        assert_eq!(a.next_samples(), b.next_samples());
        assert_eq!(a.next_samples(), b.next_samples());
    }

    #[test]
    fn test_degenerate_config_is_clamped() {
        let mut gen = SequenceGenerator::with_seed(0, 0, 9);
        let samples = gen.next_samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].len(), 1);
    }
}
