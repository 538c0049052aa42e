//! # DCGAN for Fashion-MNIST
//!
//! This crate provides a modular implementation of a Deep Convolutional Generative
//! Adversarial Network (DCGAN) that learns to synthesize 28x28 grayscale clothing
//! images.
//!
//! ## Modules
//!
//! - `data`: IDX dataset loading, pixel normalization and batching
//! - `model`: DCGAN architecture (Generator and Discriminator)
//! - `training`: Training loop, loss functions and epoch monitors
//! - `utils`: Configuration, generator artifacts and image grids
//! - `error`: Crate error type

pub mod data;
pub mod error;
pub mod model;
pub mod training;
pub mod utils;

pub use data::{normalize_images, DataLoader, FashionMnist, ImageDataset};
pub use error::{DcganError, Result};
pub use model::{Discriminator, Generator, DCGAN};
pub use training::{EpochMonitor, GanMonitor, Trainer, TrainingConfig, TrainingMetrics};
pub use utils::{Config, GeneratorMeta};
