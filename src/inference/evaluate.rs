//! Model Evaluation
//!
//! Forward-only accuracy measurement on the inner (non-autodiff) backend.
//! Training code hands in `model.valid()`; the pass never touches gradients.
//! Batch accuracies are size-weighted so a short trailing batch does not skew
//! the averages.

use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    tensor::backend::Backend,
};

use crate::dataset::batcher::EvalBatcher;
use crate::dataset::multiview::EvalItem;
use crate::model::cnn::GenreClassifier;
use crate::utils::error::{GtzanError, Result};
use crate::utils::metrics::{accuracy_topk, MeterSet};

/// Accuracy summary over one evaluation dataset
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    /// Top-1 accuracy in percent
    pub top1: f64,
    /// Top-k accuracy in percent
    pub topk: f64,
    /// The k the top-k figure was computed for
    pub k: usize,
    /// Number of evaluated examples
    pub samples: usize,
}

/// Evaluate a model over a dataset of single-view items.
///
/// The final batch may be shorter than `batch_size`; every example counts
/// once. Fails on an empty dataset rather than reporting a vacuous 0%.
pub fn evaluate<B: Backend, D: Dataset<EvalItem>>(
    model: &GenreClassifier<B>,
    dataset: &D,
    batch_size: usize,
    image_size: usize,
    topk: usize,
    device: &B::Device,
) -> Result<EvalReport> {
    if batch_size == 0 {
        return Err(GtzanError::Config(
            "evaluation batch_size must be greater than 0".to_string(),
        ));
    }
    if topk == 0 {
        return Err(GtzanError::Config("topk must be at least 1".to_string()));
    }
    if dataset.is_empty() {
        return Err(GtzanError::Dataset(
            "evaluation dataset is empty".to_string(),
        ));
    }

    let batcher = EvalBatcher::<B>::with_image_size(device.clone(), image_size);
    let mut meters = MeterSet::new();

    for start in (0..dataset.len()).step_by(batch_size) {
        let end = (start + batch_size).min(dataset.len());
        let items = (start..end)
            .map(|idx| {
                dataset.get(idx).ok_or_else(|| {
                    GtzanError::Dataset(format!(
                        "index {} is out of range for the evaluation dataset",
                        idx
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = batcher.batch(items, device);
        let output = model.forward(batch.images);

        let [rows, num_classes] = output.logits.dims();
        let flat: Vec<f32> = output.logits.into_data().iter::<f32>().collect();
        let logits: Vec<Vec<f32>> = flat.chunks(num_classes).map(|c| c.to_vec()).collect();
        let targets: Vec<usize> = batch
            .targets
            .into_data()
            .iter::<i64>()
            .map(|v| v as usize)
            .collect();

        let accs = accuracy_topk(&logits, &targets, &[1, topk]);
        meters.update("top1", accs[0], rows);
        meters.update("topk", accs[1], rows);
    }

    Ok(EvalReport {
        top1: meters.average("top1"),
        topk: meters.average("topk"),
        k: topk,
        samples: dataset.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cnn::GenreClassifierConfig;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    struct FixedPool {
        items: Vec<EvalItem>,
    }

    impl FixedPool {
        fn new(n: usize, classes: usize) -> Self {
            let items = (0..n)
                .map(|i| EvalItem {
                    image: vec![0.1 + 0.02 * i as f32; 3 * 16 * 16],
                    label: i % classes,
                })
                .collect();
            Self { items }
        }
    }

    impl Dataset<EvalItem> for FixedPool {
        fn get(&self, index: usize) -> Option<EvalItem> {
            self.items.get(index).cloned()
        }

        fn len(&self) -> usize {
            self.items.len()
        }
    }

    fn tiny_model(num_classes: usize) -> GenreClassifier<TestBackend> {
        let device = Default::default();
        let config = GenreClassifierConfig::new()
            .with_num_classes(num_classes)
            .with_base_filters(2)
            .with_embed_dim(8);
        GenreClassifier::new(&config, &device)
    }

    #[test]
    fn test_counts_every_example_with_partial_final_batch() {
        let model = tiny_model(4);
        // 10 examples with batch 4: batches of 4, 4, then 2
        let dataset = FixedPool::new(10, 4);
        let device = Default::default();

        let report = evaluate(&model, &dataset, 4, 16, 3, &device).unwrap();
        assert_eq!(report.samples, 10);
        assert_eq!(report.k, 3);
        assert!((0.0..=100.0).contains(&report.top1));
        assert!((0.0..=100.0).contains(&report.topk));
        assert!(report.topk >= report.top1);
    }

    #[test]
    fn test_topk_equal_to_class_count_is_always_full() {
        let model = tiny_model(4);
        let dataset = FixedPool::new(7, 4);
        let device = Default::default();

        let report = evaluate(&model, &dataset, 3, 16, 4, &device).unwrap();
        assert_eq!(report.topk, 100.0);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let model = tiny_model(4);
        let dataset = FixedPool::new(9, 4);
        let device = Default::default();

        let first = evaluate(&model, &dataset, 4, 16, 2, &device).unwrap();
        let second = evaluate(&model, &dataset, 4, 16, 2, &device).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_dataset_is_error() {
        let model = tiny_model(4);
        let dataset = FixedPool::new(0, 4);
        let device = Default::default();

        assert!(evaluate(&model, &dataset, 4, 16, 2, &device).is_err());
    }

    #[test]
    fn test_zero_batch_or_k_rejected() {
        let model = tiny_model(4);
        let dataset = FixedPool::new(4, 4);
        let device = Default::default();

        assert!(evaluate(&model, &dataset, 0, 16, 2, &device).is_err());
        assert!(evaluate(&model, &dataset, 4, 16, 0, &device).is_err());
    }
}
