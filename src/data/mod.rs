//! Data module for loading and preprocessing image datasets
//!
//! This module provides:
//! - IDX file parsing for Fashion-MNIST style datasets
//! - Pixel normalization to the generator's [-1, 1] range
//! - DataLoader for batching images

mod fashion_mnist;
mod loader;
mod preprocessing;

pub use fashion_mnist::{
    class_name, read_idx_images, read_idx_labels, FashionMnist, ImageDataset, CLASS_NAMES,
};
pub use loader::{batch_to_tensor, DataLoader};
pub use preprocessing::{normalize_images, to_display_range, PIXEL_SCALE};
