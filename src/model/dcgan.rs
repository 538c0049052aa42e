//! DCGAN wrapper combining Generator and Discriminator
//!
//! Each network owns a separate `VarStore`, so the two parameter sets and
//! their optimizers never overlap.

use std::path::Path;

use tch::{nn, nn::OptimizerConfig, nn::VarStore, Device, Kind, Tensor};

use super::discriminator::{Discriminator, DiscriminatorConfig};
use super::generator::{Generator, GeneratorConfig};
use crate::error::{DcganError, Result};
use crate::utils::ModelConfig;

/// Adam hyperparameters shared by both networks' optimizers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub lr: f64,
    pub beta1: f64,
    pub beta2: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            lr: 2e-4,
            beta1: 0.5,
            beta2: 0.999,
        }
    }
}

impl AdamConfig {
    fn build(&self, vs: &VarStore) -> Result<nn::Optimizer> {
        let opt = nn::Adam {
            beta1: self.beta1,
            beta2: self.beta2,
            ..Default::default()
        }
        .build(vs, self.lr)?;
        Ok(opt)
    }
}

/// Complete DCGAN model
pub struct DCGAN {
    /// Generator network
    pub generator: Generator,
    /// Discriminator network
    pub discriminator: Discriminator,
    /// Variable store for generator
    pub gen_vs: VarStore,
    /// Variable store for discriminator
    pub disc_vs: VarStore,
    /// Device (CPU/GPU)
    pub device: Device,
}

impl DCGAN {
    /// Create a new DCGAN model
    ///
    /// # Arguments
    ///
    /// * `gen_config` - Generator configuration
    /// * `disc_config` - Discriminator configuration
    /// * `device` - Device to create model on
    pub fn new(gen_config: GeneratorConfig, disc_config: DiscriminatorConfig, device: Device) -> Self {
        let gen_vs = VarStore::new(device);
        let disc_vs = VarStore::new(device);

        let generator = Generator::new(&gen_vs.root(), gen_config);
        let discriminator = Discriminator::new(&disc_vs.root(), disc_config);

        Self {
            generator,
            discriminator,
            gen_vs,
            disc_vs,
            device,
        }
    }

    /// Create a DCGAN from the model section of the configuration file
    pub fn from_config(config: &ModelConfig, device: Device) -> Result<Self> {
        config.validate()?;

        let gen_config = GeneratorConfig {
            latent_dim: config.latent_dim,
            image_size: config.image_size,
            channels: config.channels,
            base_filters: config.gen_base_filters,
            upsample_layers: config.num_layers,
            weight_init_std: config.weight_init_std,
        };

        let disc_config = DiscriminatorConfig {
            image_size: config.image_size,
            channels: config.channels,
            base_filters: config.disc_base_filters,
            downsample_layers: config.num_layers,
            dropout: config.dropout,
            leaky_slope: config.leaky_slope,
        };

        Ok(Self::new(gen_config, disc_config, device))
    }

    /// Create DCGAN with the default 28x28 grayscale architecture
    pub fn with_defaults(latent_dim: i64, device: Device) -> Self {
        let gen_config = GeneratorConfig {
            latent_dim,
            ..Default::default()
        };
        Self::new(gen_config, DiscriminatorConfig::default(), device)
    }

    /// Sample latent vectors from a standard normal distribution
    pub fn sample_latent(&self, num_samples: i64) -> Tensor {
        Tensor::randn([num_samples, self.latent_dim()], (Kind::Float, self.device))
    }

    /// Generate synthetic images in inference mode
    ///
    /// # Returns
    ///
    /// Tensor of shape (num_samples, height, width, channels)
    pub fn generate(&self, num_samples: i64) -> Tensor {
        self.generator.generate(&self.sample_latent(num_samples))
    }

    /// Generate images from specific noise vectors
    pub fn generate_from_noise(&self, noise: &Tensor) -> Tensor {
        self.generator.generate(noise)
    }

    /// Discriminate images (get probability of being real)
    pub fn discriminate(&self, images: &Tensor) -> Tensor {
        self.discriminator.classify(images)
    }

    /// Build the generator's optimizer over generator parameters only
    pub fn gen_optimizer(&self, config: &AdamConfig) -> Result<nn::Optimizer> {
        config.build(&self.gen_vs)
    }

    /// Build the discriminator's optimizer over discriminator parameters only
    pub fn disc_optimizer(&self, config: &AdamConfig) -> Result<nn::Optimizer> {
        config.build(&self.disc_vs)
    }

    /// Save generator weights
    pub fn save_generator<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.gen_vs.save(path)?;
        Ok(())
    }

    /// Load generator weights
    pub fn load_generator<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.gen_vs.load(path)?;
        Ok(())
    }

    /// Get latent dimension
    pub fn latent_dim(&self) -> i64 {
        self.generator.config().latent_dim
    }

    /// Shape of one image as [height, width, channels]
    pub fn image_shape(&self) -> [i64; 3] {
        let config = self.generator.config();
        [config.image_size, config.image_size, config.channels]
    }

    /// Check a batch has the (batch, height, width, channels) shape the networks expect
    pub fn check_image_batch(&self, images: &Tensor) -> Result<()> {
        let size = images.size();
        let [h, w, c] = self.image_shape();
        if size.len() != 4 || size[1..] != [h, w, c] {
            let batch = size.first().copied().unwrap_or(-1);
            return Err(DcganError::shape_mismatch(&[batch, h, w, c], &size));
        }
        Ok(())
    }

    /// Detached copies of the generator's trainable parameters
    pub fn generator_parameters(&self) -> Vec<Tensor> {
        snapshot(&self.gen_vs)
    }

    /// Detached copies of the discriminator's trainable parameters
    pub fn discriminator_parameters(&self) -> Vec<Tensor> {
        snapshot(&self.disc_vs)
    }

    /// Interpolate between two points in latent space
    ///
    /// Useful for visualizing smooth transitions between generated images
    ///
    /// # Arguments
    ///
    /// * `z1` - First latent vector
    /// * `z2` - Second latent vector
    /// * `steps` - Number of interpolation steps
    ///
    /// # Returns
    ///
    /// Tensor of shape (steps, height, width, channels)
    pub fn interpolate(&self, z1: &Tensor, z2: &Tensor, steps: i64) -> Result<Tensor> {
        if steps < 1 {
            return Err(DcganError::Config(format!(
                "interpolation needs at least one step, got {steps}"
            )));
        }

        let samples: Vec<Tensor> = (0..steps)
            .map(|i| {
                let alpha = if steps > 1 {
                    i as f64 / (steps - 1) as f64
                } else {
                    0.0
                };
                let z = z1 * (1.0 - alpha) + z2 * alpha;
                self.generator.generate(&z.unsqueeze(0)).squeeze_dim(0)
            })
            .collect();

        Ok(Tensor::stack(&samples, 0))
    }
}

fn snapshot(vs: &VarStore) -> Vec<Tensor> {
    tch::no_grad(|| {
        vs.trainable_variables()
            .iter()
            .map(|t| t.detach().copy())
            .collect()
    })
}

/// True when the two parameter snapshots hold bit-identical values
pub fn parameters_equal(a: &[Tensor], b: &[Tensor]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equal(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dcgan_creation() {
        let dcgan = DCGAN::with_defaults(100, Device::Cpu);

        assert_eq!(dcgan.latent_dim(), 100);
        assert_eq!(dcgan.image_shape(), [28, 28, 1]);
    }

    #[test]
    fn test_dcgan_generate() {
        let dcgan = DCGAN::with_defaults(100, Device::Cpu);

        let samples = dcgan.generate(4);
        assert_eq!(samples.size(), vec![4, 28, 28, 1]);
    }

    #[test]
    fn test_dcgan_discriminate() {
        let dcgan = DCGAN::with_defaults(100, Device::Cpu);

        let images = Tensor::randn([4, 28, 28, 1], (Kind::Float, Device::Cpu));
        let probs = dcgan.discriminate(&images);

        assert_eq!(probs.size(), vec![4, 1]);
    }

    #[test]
    fn test_dcgan_interpolate() {
        let dcgan = DCGAN::with_defaults(100, Device::Cpu);

        let z1 = Tensor::randn([100], (Kind::Float, Device::Cpu));
        let z2 = Tensor::randn([100], (Kind::Float, Device::Cpu));

        let interpolated = dcgan.interpolate(&z1, &z2, 10).unwrap();
        assert_eq!(interpolated.size(), vec![10, 28, 28, 1]);

        // Endpoints are exactly the generator's images for z1 and z2
        let first = dcgan.generate_from_noise(&z1.unsqueeze(0)).squeeze_dim(0);
        assert!(interpolated.get(0).allclose(&first, 1e-5, 1e-6, false));
    }

    #[test]
    fn test_interpolate_rejects_empty_path() {
        let dcgan = DCGAN::with_defaults(100, Device::Cpu);
        let z = Tensor::randn([100], (Kind::Float, Device::Cpu));

        for steps in [0, -3] {
            assert!(matches!(
                dcgan.interpolate(&z, &z, steps),
                Err(DcganError::Config(_))
            ));
        }
        assert_eq!(dcgan.interpolate(&z, &z, 1).unwrap().size(), vec![1, 28, 28, 1]);
    }

    #[test]
    fn test_check_image_batch() {
        let dcgan = DCGAN::with_defaults(100, Device::Cpu);

        let ok = Tensor::zeros([2, 28, 28, 1], (Kind::Float, Device::Cpu));
        assert!(dcgan.check_image_batch(&ok).is_ok());

        let nchw = Tensor::zeros([2, 1, 28, 28], (Kind::Float, Device::Cpu));
        assert!(matches!(
            dcgan.check_image_batch(&nchw),
            Err(DcganError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_separate_parameter_sets() {
        let dcgan = DCGAN::with_defaults(100, Device::Cpu);

        let gen_params = dcgan.generator_parameters();
        let disc_params = dcgan.discriminator_parameters();
        assert!(!gen_params.is_empty());
        assert!(!disc_params.is_empty());

        let gen_count: i64 = gen_params.iter().map(|t| t.numel() as i64).sum();
        let disc_count: i64 = disc_params.iter().map(|t| t.numel() as i64).sum();
        // Dense projection alone: 100 * 12544 weights + 12544 biases
        assert!(gen_count > 100 * 12544);
        assert!(disc_count > 0);
        assert!(parameters_equal(&disc_params, &dcgan.discriminator_parameters()));
    }

    #[test]
    fn test_save_and_load_generator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generator.ot");

        let source = DCGAN::with_defaults(100, Device::Cpu);
        source.save_generator(&path).unwrap();

        let mut target = DCGAN::with_defaults(100, Device::Cpu);
        assert!(!parameters_equal(
            &source.generator_parameters(),
            &target.generator_parameters()
        ));
        target.load_generator(&path).unwrap();
        assert!(parameters_equal(
            &source.generator_parameters(),
            &target.generator_parameters()
        ));
    }
}
