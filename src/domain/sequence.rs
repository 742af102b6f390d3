// ============================================================
// Layer 3 — Digit Sequence Domain Types
// ============================================================
// The sorting task works on sequences of decimal digits:
//
//   input:  [3, 1, 4, 1, 5]
//   target: [1, 1, 3, 4, 5]
//
// A DigitSequence is always unpadded. Padding to a batch length
// happens later, in the data layer, when samples are stacked.
//
// Reference: Rust Book §5 (Structs), §9 (Recoverable Errors)

use anyhow::{bail, Result};
use std::fmt;

/// Size of the symbol alphabet: the digits 0..=9.
pub const ALPHABET: usize = 10;

/// Value used to right-pad shorter sequences in a batch.
pub const PAD_DIGIT: u8 = 0;

/// An ordered list of digits, each guaranteed to be in `0..ALPHABET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitSequence(Vec<u8>);

impl DigitSequence {
    /// Build a sequence, rejecting any value outside the alphabet.
    pub fn new(digits: Vec<u8>) -> Result<Self> {
        if let Some(bad) = digits.iter().find(|&&d| d as usize >= ALPHABET) {
            bail!("{} is not a digit in 0..{}", bad, ALPHABET);
        }
        Ok(Self(digits))
    }

    /// For callers that already draw values from `0..ALPHABET`.
    pub(crate) fn new_unchecked(digits: Vec<u8>) -> Self {
        debug_assert!(digits.iter().all(|&d| (d as usize) < ALPHABET));
        Self(digits)
    }

    /// Parse user text such as `"3 1 4"`, `"3,1,4"` or `"314"`.
    /// Commas, whitespace and semicolons are treated as separators.
    pub fn parse(text: &str) -> Result<Self> {
        let mut digits = Vec::new();
        for c in text.chars() {
            if c.is_whitespace() || c == ',' || c == ';' {
                continue;
            }
            match c.to_digit(10) {
                Some(d) => digits.push(d as u8),
                None    => bail!("unexpected character '{}' in digit sequence '{}'", c, text),
            }
        }
        if digits.is_empty() {
            bail!("digit sequence '{}' is empty", text);
        }
        Ok(Self(digits))
    }

    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The ascending sort of this sequence. This is the training target.
    pub fn sorted(&self) -> Self {
        let mut digits = self.0.clone();
        digits.sort_unstable();
        Self(digits)
    }

    /// Copy of the digits right-padded with `PAD_DIGIT` up to `len`.
    /// Sequences already at least `len` long are returned unchanged.
    pub fn padded(&self, len: usize) -> Vec<u8> {
        let mut digits = self.0.clone();
        if digits.len() < len {
            digits.resize(len, PAD_DIGIT);
        }
        digits
    }
}

impl fmt::Display for DigitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

// ─── SortSample ───────────────────────────────────────────────────────────────
/// One training example: an input sequence and its sorted target.
/// Both sides always have the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSample {
    pub input:  DigitSequence,
    pub target: DigitSequence,
}

impl SortSample {
    pub fn from_input(input: DigitSequence) -> Self {
        let target = input.sorted();
        Self { input, target }
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_digit() {
        assert!(DigitSequence::new(vec![1, 2, 10]).is_err());
        assert!(DigitSequence::new(vec![0, 9]).is_ok());
        // Multi-digit text splits into single digits, never one value >= 10
        assert_eq!(DigitSequence::parse("12").unwrap().digits(), &[1, 2]);
    }

    #[test]
    fn test_parse_accepts_separators() {
        let expected = DigitSequence::new(vec![3, 1, 4]).unwrap();
        assert_eq!(DigitSequence::parse("3 1 4").unwrap(), expected);
        assert_eq!(DigitSequence::parse("3,1,4").unwrap(), expected);
        assert_eq!(DigitSequence::parse("314").unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DigitSequence::parse("3, x, 4").is_err());
        assert!(DigitSequence::parse("  ,, ").is_err());
        assert!(DigitSequence::parse("12 -3").is_err());
    }

    #[test]
    fn test_sample_target_is_sorted_permutation() {
        let input  = DigitSequence::parse("9 0 5 5 2").unwrap();
        let sample = SortSample::from_input(input.clone());
        assert_eq!(sample.target.digits(), &[0, 2, 5, 5, 9]);
        assert_eq!(sample.target, sample.target.sorted());
        assert_ne!(input, input.sorted());
        assert_eq!(sample.len(), 5);
    }

    #[test]
    fn test_padding_appends_zeros() {
        let seq = DigitSequence::parse("7 8").unwrap();
        assert_eq!(seq.padded(4), vec![7, 8, 0, 0]);
        assert_eq!(seq.padded(1), vec![7, 8]);
    }

    #[test]
    fn test_display() {
        let seq = DigitSequence::parse("1 2 3").unwrap();
        assert_eq!(seq.to_string(), "[1, 2, 3]");
    }
}
