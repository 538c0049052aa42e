//! Generator network for DCGAN
//!
//! The Generator transforms random latent vectors into synthetic images.
//! Architecture uses transposed 2D convolutions to upsample from latent space.

use tch::{nn, nn::Module, nn::ModuleT, Tensor};

use super::batch_norm_config;

/// Generator network configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Size of the latent noise vector
    pub latent_dim: i64,
    /// Height and width of the output images
    pub image_size: i64,
    /// Number of output channels (1 for grayscale)
    pub channels: i64,
    /// Filters of the projected feature map, halved by every upsampling stage
    pub base_filters: i64,
    /// Number of stride-2 transposed convolutions
    pub upsample_layers: usize,
    /// Standard deviation of the normal init for convolution kernels
    pub weight_init_std: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            latent_dim: 100,
            image_size: 28,
            channels: 1,
            base_filters: 256,
            upsample_layers: 2,
            weight_init_std: 0.02,
        }
    }
}

impl GeneratorConfig {
    /// Side length of the grid the dense projection is reshaped to
    pub fn initial_size(&self) -> i64 {
        self.image_size >> self.upsample_layers
    }
}

/// Transposed convolution followed by batch norm and ReLU
#[derive(Debug)]
struct UpBlock {
    conv: nn::ConvTranspose2D,
    bn: nn::BatchNorm,
}

impl ModuleT for UpBlock {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        xs.apply(&self.conv).apply_t(&self.bn, train).relu()
    }
}

/// Generator network
///
/// Architecture:
/// 1. Dense projection from latent space, BatchNorm, ReLU, reshape to a small grid
/// 2. Series of stride-2 ConvTranspose2d layers with BatchNorm and ReLU
/// 3. Final stride-1 Conv2d with Tanh activation
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    fc: nn::Linear,
    bn0: nn::BatchNorm,
    blocks: Vec<UpBlock>,
    out: nn::Conv2D,
}

impl Generator {
    /// Create a new Generator network
    pub fn new(vs: &nn::Path, config: GeneratorConfig) -> Self {
        let base = config.base_filters;
        let init = config.initial_size();
        let projected = base * init * init;

        let fc = nn::linear(vs / "fc", config.latent_dim, projected, Default::default());
        let bn0 = nn::batch_norm1d(vs / "bn0", projected, batch_norm_config());

        // "same" padding for kernel 5 / stride 2: output is exactly twice the input
        let up_config = nn::ConvTransposeConfig {
            stride: 2,
            padding: 2,
            output_padding: 1,
            ws_init: nn::Init::Randn {
                mean: 0.0,
                stdev: config.weight_init_std,
            },
            ..Default::default()
        };

        let mut blocks = Vec::with_capacity(config.upsample_layers);
        let mut filters = base;
        for i in 0..config.upsample_layers {
            let next = filters / 2;
            blocks.push(UpBlock {
                conv: nn::conv_transpose2d(vs / format!("up{}", i + 1), filters, next, 5, up_config),
                bn: nn::batch_norm2d(vs / format!("bn{}", i + 1), next, batch_norm_config()),
            });
            filters = next;
        }

        let out = nn::conv2d(
            vs / "out",
            filters,
            config.channels,
            5,
            nn::ConvConfig {
                padding: 2,
                ..Default::default()
            },
        );

        Self {
            config,
            fc,
            bn0,
            blocks,
            out,
        }
    }

    /// Generate synthetic images from noise
    ///
    /// # Arguments
    ///
    /// * `noise` - Tensor of shape (batch_size, latent_dim)
    /// * `train` - Whether in training mode (affects batch norm)
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch_size, image_size, image_size, channels) in [-1, 1]
    pub fn forward_t(&self, noise: &Tensor, train: bool) -> Tensor {
        let batch_size = noise.size()[0];
        let init = self.config.initial_size();

        let x = noise
            .apply(&self.fc)
            .apply_t(&self.bn0, train)
            .relu()
            .view([batch_size, self.config.base_filters, init, init]);

        let x = self
            .blocks
            .iter()
            .fold(x, |x, block| block.forward_t(&x, train));

        // NCHW -> NHWC
        self.out.forward(&x).tanh().permute([0, 2, 3, 1])
    }

    /// Generate images in inference mode without recording gradients
    pub fn generate(&self, noise: &Tensor) -> Tensor {
        tch::no_grad(|| self.forward_t(noise, false))
    }

    /// Get configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

impl ModuleT for Generator {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        Generator::forward_t(self, xs, train)
    }
}
