use burn::data::dataset::Dataset;

use crate::domain::sequence::SortSample;
use crate::domain::traits::SampleSource;

/// A frozen set of samples drawn once from a generator.
/// Used for validation so every epoch is scored on the same data.
pub struct SortDataset {
    samples: Vec<SortSample>,
}

impl SortDataset {
    /// Pull `batches` groups from `source` and keep them.
    pub fn draw<S: SampleSource>(source: &mut S, batches: usize) -> Self {
        let samples = (0..batches).flat_map(|_| source.next_samples()).collect();
        Self { samples }
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Consecutive groups of at most `batch_size` samples.
    pub fn chunks(&self, batch_size: usize) -> std::slice::Chunks<'_, SortSample> {
        self.samples.chunks(batch_size.max(1))
    }
}

impl Dataset<SortSample> for SortDataset {
    fn get(&self, index: usize) -> Option<SortSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generator::SequenceGenerator;

    #[test]
    fn test_draw_collects_every_batch() {
        let mut gen = SequenceGenerator::with_seed(5, 8, 4);
        let ds      = SortDataset::draw(&mut gen, 3);
        assert_eq!(ds.len(), 24);
        assert_eq!(ds.sample_count(), 24);
        assert!(ds.get(23).is_some());
        assert!(ds.get(24).is_none());
    }

    #[test]
    fn test_chunks_cover_all_samples() {
        let mut gen = SequenceGenerator::with_seed(5, 10, 4);
        let ds      = SortDataset::draw(&mut gen, 1);
        let sizes: Vec<usize> = ds.chunks(4).map(<[SortSample]>::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }
}
