// ============================================================
// Layer 4 — Fixed Positional Table
// ============================================================
// Self-attention treats its input as a set: permuting the
// positions permutes the output the same way. A model that must
// emit "the smallest digit first" needs to know which slot is
// which, so the second model variant adds a fixed random vector
// per position to the one-hot input:
//
//   x[pos] = one_hot(digit) + table[pos]
//
// The table is drawn once, never trained, and saved with the
// checkpoint so inference encodes inputs the same way.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::sequence::ALPHABET;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionalTable {
    /// One row of `ALPHABET` values per position index
    rows: Vec<Vec<f32>>,
}

impl PositionalTable {
    /// Draw `max_len` rows with values uniform in `[0, 1)`.
    pub fn random<R: Rng + ?Sized>(max_len: usize, rng: &mut R) -> Self {
        let rows = (0..max_len)
            .map(|_| (0..ALPHABET).map(|_| rng.gen::<f32>()).collect())
            .collect();
        Self { rows }
    }

    /// Number of positions covered by the table.
    pub fn max_len(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, pos: usize) -> Option<&[f32]> {
        self.rows.get(pos).map(Vec::as_slice)
    }

    /// Rows must all be `ALPHABET` wide; anything else came from a
    /// corrupted or foreign file.
    pub fn is_well_formed(&self) -> bool {
        self.rows.iter().all(|r| r.len() == ALPHABET)
    }
}
