//! Model module containing GAN architecture components
//!
//! This module provides:
//! - Generator network for creating synthetic images
//! - Discriminator network for distinguishing real from fake
//! - DCGAN wrapper combining both networks

mod dcgan;
mod discriminator;
mod generator;

pub use dcgan::{parameters_equal, AdamConfig, DCGAN};
pub use discriminator::{Discriminator, DiscriminatorConfig};
pub use generator::{Generator, GeneratorConfig};

use tch::{nn, Tensor};

/// Batch norm settings matching momentum 0.99 / epsilon 1e-3 running averages
pub(crate) fn batch_norm_config() -> nn::BatchNormConfig {
    nn::BatchNormConfig {
        momentum: 0.01,
        eps: 1e-3,
        ..Default::default()
    }
}

/// LeakyReLU with a configurable negative slope in (0, 1)
pub(crate) fn leaky_relu(xs: &Tensor, slope: f64) -> Tensor {
    xs.maximum(&(xs * slope))
}
