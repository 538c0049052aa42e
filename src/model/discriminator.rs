//! Discriminator network for DCGAN
//!
//! The Discriminator classifies images as real or fake.
//! Architecture uses strided 2D convolutions to downsample and extract features.

use tch::{nn, nn::Module, nn::ModuleT, Tensor};

use super::{batch_norm_config, leaky_relu};

/// Discriminator network configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorConfig {
    /// Height and width of input images
    pub image_size: i64,
    /// Number of input channels
    pub channels: i64,
    /// Filters of the first convolution, doubled by every following one
    pub base_filters: i64,
    /// Number of stride-2 convolutions
    pub downsample_layers: usize,
    /// Dropout rate before the classifier
    pub dropout: f64,
    /// Negative slope of the LeakyReLU activations
    pub leaky_slope: f64,
}

impl Default for DiscriminatorConfig {
    fn default() -> Self {
        Self {
            image_size: 28,
            channels: 1,
            base_filters: 64,
            downsample_layers: 2,
            dropout: 0.3,
            leaky_slope: 0.2,
        }
    }
}

impl DiscriminatorConfig {
    /// Spatial size after all strided convolutions ("same" padding rounds up)
    pub fn final_size(&self) -> i64 {
        (0..self.downsample_layers).fold(self.image_size, |s, _| (s + 1) / 2)
    }

    /// Number of filters produced by the last convolution
    pub fn final_filters(&self) -> i64 {
        self.base_filters << self.downsample_layers.saturating_sub(1)
    }
}

/// Discriminator network
///
/// Architecture:
/// 1. Series of stride-2 Conv2d layers with BatchNorm and LeakyReLU
/// 2. Flatten, Dropout and a single-unit Dense layer
#[derive(Debug)]
pub struct Discriminator {
    config: DiscriminatorConfig,
    convs: Vec<(nn::Conv2D, nn::BatchNorm)>,
    fc: nn::Linear,
}

impl Discriminator {
    /// Create a new Discriminator network
    pub fn new(vs: &nn::Path, config: DiscriminatorConfig) -> Self {
        let conv_config = nn::ConvConfig {
            stride: 2,
            padding: 2,
            ..Default::default()
        };

        let mut convs = Vec::with_capacity(config.downsample_layers);
        let mut in_channels = config.channels;
        for i in 0..config.downsample_layers {
            let out_channels = config.base_filters << i;
            let conv = nn::conv2d(
                vs / format!("conv{}", i + 1),
                in_channels,
                out_channels,
                5,
                conv_config,
            );
            let bn = nn::batch_norm2d(vs / format!("bn{}", i + 1), out_channels, batch_norm_config());
            convs.push((conv, bn));
            in_channels = out_channels;
        }

        let final_size = config.final_size();
        let flat_size = in_channels * final_size * final_size;
        let fc = nn::linear(vs / "fc", flat_size, 1, Default::default());

        Self { config, convs, fc }
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape (batch_size, image_size, image_size, channels)
    /// * `train` - Whether in training mode (affects batch norm and dropout)
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch_size, 1) with logits (not sigmoid)
    pub fn forward_t(&self, input: &Tensor, train: bool) -> Tensor {
        // NHWC -> NCHW for Conv2D
        let x = input.permute([0, 3, 1, 2]);

        let x = self.convs.iter().fold(x, |x, (conv, bn)| {
            leaky_relu(&conv.forward(&x).apply_t(bn, train), self.config.leaky_slope)
        });

        x.flatten(1, -1)
            .dropout(self.config.dropout, train)
            .apply(&self.fc)
    }

    /// Classify samples (inference mode)
    ///
    /// Returns probability of being real (after sigmoid)
    pub fn classify(&self, input: &Tensor) -> Tensor {
        tch::no_grad(|| self.forward_t(input, false).sigmoid())
    }

    /// Get configuration
    pub fn config(&self) -> &DiscriminatorConfig {
        &self.config
    }
}

impl ModuleT for Discriminator {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        Discriminator::forward_t(self, xs, train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    #[test]
    fn test_discriminator_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());

        let input = Tensor::randn([4, 28, 28, 1], (Kind::Float, Device::Cpu));
        let output = disc.forward_t(&input, true);

        assert_eq!(output.size(), vec![4, 1]);
    }

    #[test]
    fn test_discriminator_classify() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());

        let input = Tensor::randn([5, 28, 28, 1], (Kind::Float, Device::Cpu)) * 20.0;
        let probs = disc.classify(&input);

        assert_eq!(probs.size(), vec![5, 1]);
        let min_val = probs.min().double_value(&[]);
        let max_val = probs.max().double_value(&[]);
        assert!(min_val >= 0.0 && max_val <= 1.0);
    }

    #[test]
    fn test_final_size() {
        let config = DiscriminatorConfig::default();
        assert_eq!(config.final_size(), 7);
        assert_eq!(config.final_filters(), 128);

        let odd = DiscriminatorConfig {
            image_size: 30,
            downsample_layers: 3,
            ..Default::default()
        };
        // 30 -> 15 -> 8 -> 4
        assert_eq!(odd.final_size(), 4);
        assert_eq!(odd.final_filters(), 256);
    }

    #[test]
    fn test_discriminator_odd_size_forward() {
        let vs = VarStore::new(Device::Cpu);
        let config = DiscriminatorConfig {
            image_size: 30,
            channels: 3,
            downsample_layers: 3,
            base_filters: 8,
            ..Default::default()
        };
        let disc = Discriminator::new(&vs.root(), config);

        let input = Tensor::zeros([2, 30, 30, 3], (Kind::Float, Device::Cpu));
        assert_eq!(disc.forward_t(&input, false).size(), vec![2, 1]);
    }
}
