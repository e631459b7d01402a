//! Eternal shuffled index stream
//!
//! The labeled pool is far smaller than the unlabeled pool, so a plain
//! once-through enumeration would exhaust it mid-epoch. `EternalSampler`
//! yields labeled indices forever: it holds one shuffled permutation and a
//! cursor, and draws a fresh independent permutation whenever the cursor
//! walks past the end. Every element appears exactly once per cycle.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::utils::error::{GtzanError, Result};

/// Infinite re-shuffled stream over a fixed index set.
///
/// Owned by exactly one consumer; created once per training run and consumed
/// lazily across epochs without re-initialization.
#[derive(Debug, Clone)]
pub struct EternalSampler {
    order: Vec<usize>,
    cursor: usize,
    rng: ChaCha8Rng,
}

impl EternalSampler {
    /// Create a sampler over the given indices.
    ///
    /// An empty index set would make the stream loop forever without
    /// producing anything useful, so it is rejected here rather than
    /// discovered mid-run.
    pub fn new(indices: Vec<usize>, seed: u64) -> Result<Self> {
        if indices.is_empty() {
            return Err(GtzanError::Config(
                "cannot build an eternal sampler over an empty index set".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut order = indices;
        order.shuffle(&mut rng);

        Ok(Self {
            order,
            cursor: 0,
            rng,
        })
    }

    /// Next index from the stream. Never fails after construction.
    pub fn next_index(&mut self) -> usize {
        if self.cursor >= self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
        }

        let index = self.order[self.cursor];
        self.cursor += 1;
        index
    }

    /// Next `n` indices grouped into one batch.
    pub fn next_batch(&mut self, n: usize) -> Vec<usize> {
        (0..n).map(|_| self.next_index()).collect()
    }
}

impl Iterator for EternalSampler {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        Some(self.next_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index_set_rejected() {
        assert!(matches!(
            EternalSampler::new(Vec::new(), 42),
            Err(GtzanError::Config(_))
        ));
    }

    #[test]
    fn test_each_cycle_is_a_permutation() {
        let indices: Vec<usize> = (10..20).collect();
        let mut sampler = EternalSampler::new(indices.clone(), 42).unwrap();

        for _ in 0..5 {
            let mut cycle: Vec<usize> = (0..indices.len()).map(|_| sampler.next_index()).collect();
            cycle.sort_unstable();
            assert_eq!(cycle, indices);
        }
    }

    #[test]
    fn test_cycles_are_reshuffled() {
        let indices: Vec<usize> = (0..50).collect();
        let mut sampler = EternalSampler::new(indices, 42).unwrap();

        let first: Vec<usize> = (0..50).map(|_| sampler.next_index()).collect();
        let second: Vec<usize> = (0..50).map(|_| sampler.next_index()).collect();

        assert_ne!(first, second);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let indices: Vec<usize> = (0..16).collect();
        let mut a = EternalSampler::new(indices.clone(), 7).unwrap();
        let mut b = EternalSampler::new(indices, 7).unwrap();

        let seq_a: Vec<usize> = (0..100).map(|_| a.next_index()).collect();
        let seq_b: Vec<usize> = (0..100).map(|_| b.next_index()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_next_batch_spans_cycle_boundary() {
        // 6 elements, batches of 4: the second batch crosses the wraparound
        // and still contains valid indices only.
        let indices: Vec<usize> = (0..6).collect();
        let mut sampler = EternalSampler::new(indices.clone(), 3).unwrap();

        let first = sampler.next_batch(4);
        let second = sampler.next_batch(4);
        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 4);

        for idx in first.iter().chain(second.iter()) {
            assert!(indices.contains(idx));
        }

        // The first 6 draws form one complete cycle.
        let mut cycle: Vec<usize> = first.into_iter().chain(second.into_iter()).take(6).collect();
        cycle.sort_unstable();
        assert_eq!(cycle, indices);
    }

    #[test]
    fn test_iterator_impl_never_ends() {
        let mut sampler = EternalSampler::new(vec![1, 2, 3], 0).unwrap();
        assert!(sampler.next().is_some());
        let many: Vec<usize> = sampler.by_ref().take(1000).collect();
        assert_eq!(many.len(), 1000);
    }
}
