//! CNN Model Architecture for Genre Classification
//!
//! Convolutional network over spectrogram images built with the Burn
//! framework. The forward pass returns both class logits and the penultimate
//! embedding: the logits drive the losses, the embedding feeds feature
//! extraction for downstream label propagation.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Configuration for the GenreClassifier CNN model
#[derive(Config, Debug)]
pub struct GenreClassifierConfig {
    /// Number of output classes (10 GTZAN genres)
    #[config(default = "10")]
    pub num_classes: usize,

    /// Dropout rate for the classifier head
    #[config(default = "0.3")]
    pub dropout_rate: f64,

    /// Number of input channels (3 for RGB spectrogram renders)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Base number of convolutional filters
    #[config(default = "32")]
    pub base_filters: usize,

    /// Width of the penultimate embedding
    #[config(default = "128")]
    pub embed_dim: usize,
}

/// Model output: class logits plus the auxiliary embedding
#[derive(Debug, Clone)]
pub struct ClassifierOutput<B: Backend> {
    /// Class scores with shape [batch_size, num_classes]
    pub logits: Tensor<B, 2>,
    /// Penultimate representation with shape [batch_size, embed_dim]
    pub embedding: Tensor<B, 2>,
}

/// A CNN block with Conv2d, BatchNorm, ReLU, and MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
    relu: Relu,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    /// Create a new convolutional block
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        let bn = BatchNormConfig::new(out_channels).init(device);

        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    /// Forward pass through the block, halving the spatial size
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Genre classifier CNN
///
/// Architecture:
/// - 4 convolutional blocks with doubling filter counts
/// - Global average pooling (input size independent)
/// - Embedding layer followed by a dropout-regularized classifier head
#[derive(Module, Debug)]
pub struct GenreClassifier<B: Backend> {
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    conv3: ConvBlock<B>,
    conv4: ConvBlock<B>,

    global_pool: AdaptiveAvgPool2d,

    embed: Linear<B>,
    relu: Relu,
    dropout: Dropout,
    classifier: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> GenreClassifier<B> {
    /// Create a new GenreClassifier from configuration
    pub fn new(config: &GenreClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        // 3 -> 32 -> 64 -> 128 -> 256 with spatial halving per block
        let conv1 = ConvBlock::new(config.in_channels, base, device);
        let conv2 = ConvBlock::new(base, base * 2, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, device);
        let conv4 = ConvBlock::new(base * 4, base * 8, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        let embed = LinearConfig::new(base * 8, config.embed_dim).init(device);
        let dropout = DropoutConfig::new(config.dropout_rate).init();
        let classifier = LinearConfig::new(config.embed_dim, config.num_classes).init(device);

        Self {
            conv1,
            conv2,
            conv3,
            conv4,
            global_pool,
            embed,
            relu: Relu::new(),
            dropout,
            classifier,
            num_classes: config.num_classes,
        }
    }

    /// Forward pass.
    ///
    /// Input shape [batch_size, channels, height, width]; returns logits
    /// [batch_size, num_classes] and the embedding [batch_size, embed_dim].
    pub fn forward(&self, x: Tensor<B, 4>) -> ClassifierOutput<B> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let embedding = self.relu.forward(self.embed.forward(x));
        let logits = self.classifier.forward(self.dropout.forward(embedding.clone()));

        ClassifierOutput { logits, embedding }
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_output_shapes() {
        let device = Default::default();
        let config = GenreClassifierConfig::new();
        let model = GenreClassifier::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.logits.dims(), [2, 10]);
        assert_eq!(output.embedding.dims(), [2, 128]);
    }

    #[test]
    fn test_input_size_independence() {
        // Global average pooling makes the head independent of the
        // spectrogram resolution.
        let device = Default::default();
        let config = GenreClassifierConfig::new().with_base_filters(8).with_embed_dim(16);
        let model = GenreClassifier::<TestBackend>::new(&config, &device);

        let small = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        let large = Tensor::<TestBackend, 4>::zeros([1, 3, 128, 128], &device);

        assert_eq!(model.forward(small).logits.dims(), [1, 10]);
        assert_eq!(model.forward(large).logits.dims(), [1, 10]);
    }

    #[test]
    fn test_custom_class_count() {
        let device = Default::default();
        let config = GenreClassifierConfig::new()
            .with_num_classes(5)
            .with_base_filters(8);
        let model = GenreClassifier::<TestBackend>::new(&config, &device);

        assert_eq!(model.num_classes(), 5);
        let input = Tensor::<TestBackend, 4>::zeros([3, 3, 32, 32], &device);
        assert_eq!(model.forward(input).logits.dims(), [3, 5]);
    }
}
