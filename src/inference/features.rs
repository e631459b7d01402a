//! Feature Extraction
//!
//! Collects the model's penultimate embeddings over a dataset into a
//! host-side matrix, one row per example in dataset order. The matrix feeds
//! downstream label propagation over the unlabeled pool, so row order must
//! match the dataset's index order exactly.

use std::path::Path;

use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    tensor::backend::Backend,
};
use serde::{Deserialize, Serialize};

use crate::dataset::batcher::EvalBatcher;
use crate::dataset::multiview::EvalItem;
use crate::model::cnn::GenreClassifier;
use crate::utils::error::{GtzanError, Result};

/// Embeddings for a whole dataset, row `i` belonging to dataset index `i`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix {
    /// One embedding row per example
    pub features: Vec<Vec<f32>>,
    /// Ground-truth label per example, aligned with `features`
    pub labels: Vec<usize>,
}

impl FeatureMatrix {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Embedding width, 0 for an empty matrix
    pub fn dim(&self) -> usize {
        self.features.first().map_or(0, |row| row.len())
    }

    /// Write the matrix as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a matrix back from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let matrix = serde_json::from_str(&json)?;
        Ok(matrix)
    }
}

/// Run the model over `dataset` and collect embeddings in dataset order.
pub fn extract_features<B: Backend, D: Dataset<EvalItem>>(
    model: &GenreClassifier<B>,
    dataset: &D,
    batch_size: usize,
    image_size: usize,
    device: &B::Device,
) -> Result<FeatureMatrix> {
    if batch_size == 0 {
        return Err(GtzanError::Config(
            "extraction batch_size must be greater than 0".to_string(),
        ));
    }
    if dataset.is_empty() {
        return Err(GtzanError::Dataset(
            "feature extraction dataset is empty".to_string(),
        ));
    }

    let batcher = EvalBatcher::<B>::with_image_size(device.clone(), image_size);
    let mut features = Vec::with_capacity(dataset.len());
    let mut labels = Vec::with_capacity(dataset.len());

    for start in (0..dataset.len()).step_by(batch_size) {
        let end = (start + batch_size).min(dataset.len());
        let items = (start..end)
            .map(|idx| {
                dataset.get(idx).ok_or_else(|| {
                    GtzanError::Dataset(format!(
                        "index {} is out of range for the extraction dataset",
                        idx
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = batcher.batch(items, device);
        let output = model.forward(batch.images);

        let [_, embed_dim] = output.embedding.dims();
        let flat: Vec<f32> = output.embedding.into_data().iter::<f32>().collect();
        features.extend(flat.chunks(embed_dim).map(|row| row.to_vec()));
        labels.extend(
            batch
                .targets
                .into_data()
                .iter::<i64>()
                .map(|v| v as usize),
        );
    }

    Ok(FeatureMatrix { features, labels })
}
