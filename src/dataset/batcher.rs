//! Batchers for GTZAN training and evaluation
//!
//! Converts host-side items into normalized device tensors. The multi-view
//! batcher keeps the views separate: view v of the batch stacks view v of
//! every item, so all view tensors share the item order and one target
//! vector. ImageNet normalization is applied here, after batching.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

use crate::dataset::multiview::{EvalItem, MultiViewItem};
use crate::IMAGE_SIZE;

/// ImageNet channel means (spectrogram renders reuse pretrained-style scaling)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Apply ImageNet normalization: (x - mean) / std
fn normalize<B: Backend>(images: Tensor<B, 4>, device: &B::Device) -> Tensor<B, 4> {
    let mean = Tensor::<B, 4>::from_floats(
        TensorData::new(IMAGENET_MEAN.to_vec(), [1, 3, 1, 1]),
        device,
    );
    let std = Tensor::<B, 4>::from_floats(
        TensorData::new(IMAGENET_STD.to_vec(), [1, 3, 1, 1]),
        device,
    );

    (images - mean) / std
}

/// A batch of multi-view training items.
///
/// `views[v]` has shape [batch_size, 3, H, W]; row i of every view tensor
/// belongs to the same underlying item, and `targets[i]` is its label.
#[derive(Clone, Debug)]
pub struct MultiViewBatch<B: Backend> {
    /// One tensor per view index
    pub views: Vec<Tensor<B, 4>>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> MultiViewBatch<B> {
    /// Number of items in the batch
    pub fn batch_size(&self) -> usize {
        self.targets.dims()[0]
    }

    /// Number of views per item
    pub fn num_views(&self) -> usize {
        self.views.len()
    }
}

/// Batcher for multi-view training batches
#[derive(Clone, Debug)]
pub struct MultiViewBatcher<B: Backend> {
    #[allow(dead_code)]
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> MultiViewBatcher<B> {
    /// Create a new batcher for the given device
    pub fn new(device: B::Device) -> Self {
        Self {
            device,
            image_size: IMAGE_SIZE,
        }
    }

    /// Create a batcher with custom image size
    pub fn with_image_size(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<B, MultiViewItem, MultiViewBatch<B>> for MultiViewBatcher<B> {
    fn batch(&self, items: Vec<MultiViewItem>, device: &B::Device) -> MultiViewBatch<B> {
        let batch_size = items.len();
        let channels = 3;
        let height = self.image_size;
        let width = self.image_size;
        let aug_num = items.first().map_or(0, |item| item.views.len());

        let views = (0..aug_num)
            .map(|v| {
                let view_data: Vec<f32> = items
                    .iter()
                    .flat_map(|item| item.views[v].clone())
                    .collect();

                let view = Tensor::<B, 4>::from_floats(
                    TensorData::new(view_data, [batch_size, channels, height, width]),
                    device,
                );

                normalize(view, device)
            })
            .collect();

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        MultiViewBatch { views, targets }
    }
}

/// A batch of single-view evaluation items
#[derive(Clone, Debug)]
pub struct EvalBatch<B: Backend> {
    /// Images with shape [batch_size, 3, H, W]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher for evaluation and supervised training batches
#[derive(Clone, Debug)]
pub struct EvalBatcher<B: Backend> {
    #[allow(dead_code)]
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> EvalBatcher<B> {
    /// Create a new batcher for the given device
    pub fn new(device: B::Device) -> Self {
        Self {
            device,
            image_size: IMAGE_SIZE,
        }
    }

    /// Create a batcher with custom image size
    pub fn with_image_size(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<B, EvalItem, EvalBatch<B>> for EvalBatcher<B> {
    fn batch(&self, items: Vec<EvalItem>, device: &B::Device) -> EvalBatch<B> {
        let batch_size = items.len();
        let channels = 3;
        let height = self.image_size;
        let width = self.image_size;

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, channels, height, width]),
            device,
        );
        let images = normalize(images, device);

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        EvalBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn view(fill: f32, size: usize) -> Vec<f32> {
        vec![fill; 3 * size * size]
    }

    #[test]
    fn test_multi_view_batch_shapes() {
        let device = Default::default();
        let batcher = MultiViewBatcher::<TestBackend>::with_image_size(device, 4);

        let items = vec![
            MultiViewItem {
                views: vec![view(0.1, 4), view(0.2, 4)],
                label: 3,
            },
            MultiViewItem {
                views: vec![view(0.3, 4), view(0.4, 4)],
                label: 7,
            },
        ];

        let batch = batcher.batch(items, &Default::default());

        assert_eq!(batch.num_views(), 2);
        assert_eq!(batch.batch_size(), 2);
        for v in &batch.views {
            assert_eq!(v.dims(), [2, 3, 4, 4]);
        }

        let targets: Vec<i64> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![3, 7]);
    }

    #[test]
    fn test_normalization_centers_channel_means() {
        let device = Default::default();
        let batcher = EvalBatcher::<TestBackend>::with_image_size(device, 1);

        // One pixel per channel, set exactly to the ImageNet means
        let items = vec![EvalItem {
            image: IMAGENET_MEAN.to_vec(),
            label: 0,
        }];

        let batch = batcher.batch(items, &Default::default());
        let values: Vec<f32> = batch.images.into_data().to_vec().unwrap();

        for v in values {
            assert!(v.abs() < 1e-6);
        }
    }

    #[test]
    fn test_eval_batch_shapes() {
        let device = Default::default();
        let batcher = EvalBatcher::<TestBackend>::with_image_size(device, 4);

        let items = vec![
            EvalItem {
                image: view(0.5, 4),
                label: 1,
            },
            EvalItem {
                image: view(0.6, 4),
                label: 2,
            },
            EvalItem {
                image: view(0.7, 4),
                label: 9,
            },
        ];

        let batch = batcher.batch(items, &Default::default());
        assert_eq!(batch.images.dims(), [3, 3, 4, 4]);
        assert_eq!(batch.targets.dims(), [3]);
    }
}
