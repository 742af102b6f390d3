// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits rather than to
// the concrete generator or the burn-backed inferencer.
//
//   - SequenceGenerator implements SampleSource
//   - SortUseCase       implements Sorter
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::sequence::{DigitSequence, SortSample};

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Anything that can hand out unpadded sorting samples, one batch at a time.
pub trait SampleSource {
    /// The next group of samples. Never empty for an unbounded source.
    fn next_samples(&mut self) -> Vec<SortSample>;
}

// ─── Sorter ───────────────────────────────────────────────────────────────────
/// Any component that can sort a digit sequence.
///
/// Implementations:
///   - SortUseCase → runs the trained transformer
pub trait Sorter {
    fn sort(&self, input: &DigitSequence) -> Result<DigitSequence>;
}
