// ============================================================
// Layer 5 — Sorting Accuracy
// ============================================================
// Loss alone hides how close the model is to a working sort,
// so validation also counts:
//
//   token accuracy    — real (non-padding) positions predicted right
//   sequence accuracy — sequences whose every real position is right
//
// Padding slots are excluded: predicting the pad digit is easy and
// would inflate both numbers on batches with short sequences.

/// Running totals over one or more batches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortScore {
    pub loss_sum:          f64,
    pub batches:           usize,
    pub correct_tokens:    usize,
    pub total_tokens:      usize,
    pub correct_sequences: usize,
    pub total_sequences:   usize,
}

impl SortScore {
    /// Add one batch. `predicted` and `targets` are row-major
    /// `[lengths.len(), pad_len]`.
    pub fn add_batch(
        &mut self,
        loss:      f64,
        predicted: &[i64],
        targets:   &[i64],
        lengths:   &[usize],
        pad_len:   usize,
    ) {
        self.loss_sum += loss;
        self.batches  += 1;

        for (row, &len) in lengths.iter().enumerate() {
            let start = row * pad_len;
            let len   = len.min(pad_len);
            let hits  = predicted[start..start + len]
                .iter()
                .zip(&targets[start..start + len])
                .filter(|(p, t)| p == t)
                .count();
            self.correct_tokens += hits;
            self.total_tokens   += len;
            if hits == len {
                self.correct_sequences += 1;
            }
            self.total_sequences += 1;
        }
    }

    pub fn mean_loss(&self) -> f64 {
        if self.batches > 0 { self.loss_sum / self.batches as f64 } else { f64::NAN }
    }

    pub fn token_accuracy(&self) -> f64 {
        if self.total_tokens > 0 {
            self.correct_tokens as f64 / self.total_tokens as f64
        } else { 0.0 }
    }

    pub fn sequence_accuracy(&self) -> f64 {
        if self.total_sequences > 0 {
            self.correct_sequences as f64 / self.total_sequences as f64
        } else { 0.0 }
    }
}
