//! Dataset module for GTZAN spectrogram data handling
//!
//! This module provides functionality for:
//! - Loading GTZAN spectrogram splits from disk
//! - Label-file driven labeled/unlabeled partitions
//! - Per-view stochastic spectrogram transforms
//! - Burn `Dataset` and `Batcher` implementations for both training paths
//!
//! ## Data layout
//!
//! Each split directory holds one subdirectory per genre. The labeled subset
//! of the training split is declared by a label file with one
//! `<file_name> <genre>` pair per line; all remaining training samples form
//! the unlabeled pool.

pub mod augment;
pub mod batcher;
pub mod loader;
pub mod multiview;
pub mod split;

// Re-export main types for convenience
pub use augment::{Identity, SpectrogramAugment, SpectrogramAugmentConfig, ViewTransform};
pub use batcher::{EvalBatch, EvalBatcher, MultiViewBatch, MultiViewBatcher};
pub use loader::{DatasetStats, GtzanDataset, GtzanSample};
pub use multiview::{EvalItem, MultiViewDataset, MultiViewItem, SingleViewDataset};
pub use split::{IndexSplit, SplitStats};

/// The ten GTZAN genres in label order
pub const GENRES: [&str; 10] = [
    "blues",
    "classical",
    "country",
    "disco",
    "hiphop",
    "jazz",
    "metal",
    "pop",
    "reggae",
    "rock",
];

/// Get the genre name for a given label index
pub fn genre_name(label: usize) -> Option<&'static str> {
    GENRES.get(label).copied()
}

/// Get the label index for a given genre name
pub fn genre_index(name: &str) -> Option<usize> {
    GENRES.iter().position(|&n| n == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_name() {
        assert_eq!(genre_name(0), Some("blues"));
        assert_eq!(genre_name(9), Some("rock"));
        assert_eq!(genre_name(10), None);
    }

    #[test]
    fn test_genre_index() {
        assert_eq!(genre_index("jazz"), Some(5));
        assert_eq!(genre_index("polka"), None);
    }

    #[test]
    fn test_genres_are_sorted() {
        let mut sorted = GENRES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, GENRES.to_vec());
    }
}
