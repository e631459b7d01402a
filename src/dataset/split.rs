//! Labeled/Unlabeled Partition Module
//!
//! Semi-supervised training needs a fixed partition of the training split
//! into a small labeled pool and a large unlabeled pool. The partition is
//! driven by a label file with one `<file_name> <genre>` pair per line; every
//! listed sample is labeled, everything else in the split is unlabeled.
//!
//! The partition is validated strictly: a listed file that is missing from
//! the dataset or carries the wrong genre is an error, not a skip. A silently
//! shrunken labeled pool would change the ratio of every training step.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tracing::info;

use crate::dataset::loader::GtzanDataset;
use crate::utils::error::{GtzanError, Result};

/// Immutable partition of dataset indices into labeled and unlabeled pools.
///
/// The two sets are disjoint and together cover the whole split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSplit {
    /// Indices of labeled samples, in dataset order
    pub labeled: Vec<usize>,
    /// Indices of unlabeled samples, in dataset order
    pub unlabeled: Vec<usize>,
}

impl IndexSplit {
    /// Build a partition from a label file.
    ///
    /// The file holds one `<file_name> <genre>` pair per line, e.g.
    /// `blues.00001.png blues`. Blank lines are skipped. Every listed file
    /// must exist in the dataset exactly once and its genre must match the
    /// dataset's label for that file.
    pub fn from_label_file(dataset: &GtzanDataset, path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GtzanError::Dataset(format!(
                "cannot read label file {}: {}",
                path.display(),
                e
            ))
        })?;

        // file_name -> dataset index
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (idx, sample) in dataset.samples.iter().enumerate() {
            if let Some(name) = sample.path.file_name().and_then(|n| n.to_str()) {
                by_name.insert(name.to_string(), idx);
            }
        }

        let mut labeled_flags = vec![false; dataset.len()];
        let mut labeled_count = 0usize;

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (Some(file_name), Some(genre)) = (parts.next(), parts.next()) else {
                return Err(GtzanError::Dataset(format!(
                    "malformed label file line {}: '{}'",
                    line_no + 1,
                    line
                )));
            };

            if !dataset.class_to_idx.contains_key(genre) {
                return Err(GtzanError::Dataset(format!(
                    "label file line {}: unknown genre '{}'",
                    line_no + 1,
                    genre
                )));
            }

            let Some(&idx) = by_name.get(file_name) else {
                return Err(GtzanError::Dataset(format!(
                    "label file line {}: '{}' is not in the dataset",
                    line_no + 1,
                    file_name
                )));
            };

            if dataset.samples[idx].genre != genre {
                return Err(GtzanError::Dataset(format!(
                    "label file line {}: '{}' is labeled '{}' but the dataset has it under '{}'",
                    line_no + 1,
                    file_name,
                    genre,
                    dataset.samples[idx].genre
                )));
            }

            if labeled_flags[idx] {
                return Err(GtzanError::Dataset(format!(
                    "label file line {}: '{}' listed more than once",
                    line_no + 1,
                    file_name
                )));
            }

            labeled_flags[idx] = true;
            labeled_count += 1;
        }

        if labeled_count == 0 {
            return Err(GtzanError::Dataset(format!(
                "label file {} marks no samples as labeled",
                path.display()
            )));
        }

        if labeled_count == dataset.len() {
            return Err(GtzanError::Dataset(
                "label file marks every sample as labeled; no unlabeled pool remains".to_string(),
            ));
        }

        let mut labeled = Vec::with_capacity(labeled_count);
        let mut unlabeled = Vec::with_capacity(dataset.len() - labeled_count);
        for (idx, flag) in labeled_flags.iter().enumerate() {
            if *flag {
                labeled.push(idx);
            } else {
                unlabeled.push(idx);
            }
        }

        info!(
            "Label file {}: {} labeled, {} unlabeled",
            path.display(),
            labeled.len(),
            unlabeled.len()
        );

        Ok(Self { labeled, unlabeled })
    }

    /// Number of labeled samples
    pub fn num_labeled(&self) -> usize {
        self.labeled.len()
    }

    /// Number of unlabeled samples
    pub fn num_unlabeled(&self) -> usize {
        self.unlabeled.len()
    }

    /// Compute split statistics against the dataset the split was built from
    pub fn stats(&self, dataset: &GtzanDataset) -> SplitStats {
        let mut labeled_per_class = vec![0usize; dataset.num_classes()];
        for &idx in &self.labeled {
            labeled_per_class[dataset.samples[idx].label] += 1;
        }

        SplitStats {
            total: dataset.len(),
            labeled: self.labeled.len(),
            unlabeled: self.unlabeled.len(),
            labeled_per_class,
            genres: dataset.genres.clone(),
        }
    }
}

/// Statistics about a labeled/unlabeled partition
#[derive(Debug, Clone)]
pub struct SplitStats {
    pub total: usize,
    pub labeled: usize,
    pub unlabeled: usize,
    pub labeled_per_class: Vec<usize>,
    pub genres: Vec<String>,
}

impl fmt::Display for SplitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Split Statistics:")?;
        writeln!(
            f,
            "  Labeled:   {:5} ({:.1}%)",
            self.labeled,
            100.0 * self.labeled as f64 / self.total.max(1) as f64
        )?;
        writeln!(
            f,
            "  Unlabeled: {:5} ({:.1}%)",
            self.unlabeled,
            100.0 * self.unlabeled as f64 / self.total.max(1) as f64
        )?;
        writeln!(f, "  Labeled per genre:")?;
        for (genre, count) in self.genres.iter().zip(self.labeled_per_class.iter()) {
            writeln!(f, "    {:12} {}", genre, count)?;
        }
        Ok(())
    }
}
