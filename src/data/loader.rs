//! DataLoader for batching and iterating over training images
//!
//! Provides batching for GAN training with support for:
//! - Random shuffling (optionally seeded)
//! - Drop last incomplete batch
//! - Iteration over batches

use ndarray::{Array4, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tch::{Device, Tensor};

use crate::error::{DcganError, Result};

/// DataLoader for iterating over batched images
pub struct DataLoader {
    /// Full dataset of shape (num_images, height, width, channels)
    data: Array4<f32>,
    /// Batch size
    batch_size: usize,
    /// Whether to shuffle data each epoch
    shuffle: bool,
    /// Whether to drop the last incomplete batch
    drop_last: bool,
    /// Current indices for iteration
    indices: Vec<usize>,
    /// Current position in iteration
    current_idx: usize,
    rng: StdRng,
}

impl DataLoader {
    /// Create a new DataLoader
    ///
    /// # Arguments
    ///
    /// * `data` - 4D array of shape (num_images, height, width, channels)
    /// * `batch_size` - Number of images per batch
    /// * `shuffle` - Whether to shuffle data each epoch
    /// * `drop_last` - Whether to drop incomplete final batch
    /// * `seed` - Seed for the shuffling RNG, entropy-seeded when `None`
    pub fn new(
        data: Array4<f32>,
        batch_size: usize,
        shuffle: bool,
        drop_last: bool,
        seed: Option<u64>,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(DcganError::Config("batch size must be > 0".to_string()));
        }
        let num_samples = data.shape()[0];
        if num_samples == 0 {
            return Err(DcganError::EmptyDataset);
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut loader = Self {
            data,
            batch_size,
            shuffle,
            drop_last,
            indices: (0..num_samples).collect(),
            current_idx: 0,
            rng,
        };

        if shuffle {
            loader.shuffle_indices();
        }

        Ok(loader)
    }

    /// Get the number of batches per epoch
    pub fn num_batches(&self) -> usize {
        let num_samples = self.num_samples();
        if self.drop_last {
            num_samples / self.batch_size
        } else {
            num_samples.div_ceil(self.batch_size)
        }
    }

    /// Get total number of images
    pub fn num_samples(&self) -> usize {
        self.data.shape()[0]
    }

    /// Shape of a single image as (height, width, channels)
    pub fn image_shape(&self) -> (usize, usize, usize) {
        let shape = self.data.shape();
        (shape[1], shape[2], shape[3])
    }

    /// Get batch size
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn shuffle_indices(&mut self) {
        self.indices.shuffle(&mut self.rng);
    }

    /// Reset for new epoch
    pub fn reset(&mut self) {
        self.current_idx = 0;
        if self.shuffle {
            self.shuffle_indices();
        }
    }

    /// Get next batch
    ///
    /// Returns None when epoch is complete
    pub fn next_batch(&mut self) -> Option<Array4<f32>> {
        let num_samples = self.indices.len();
        let start = self.current_idx;

        if start >= num_samples {
            return None;
        }

        let end = (start + self.batch_size).min(num_samples);
        if self.drop_last && end - start < self.batch_size {
            return None;
        }

        let batch = self.data.select(Axis(0), &self.indices[start..end]);
        self.current_idx = end;
        Some(batch)
    }

    /// Iterate over all batches of one epoch
    pub fn iter(&mut self) -> DataLoaderIter<'_> {
        self.reset();
        DataLoaderIter { loader: self }
    }
}

/// Iterator adapter for DataLoader
pub struct DataLoaderIter<'a> {
    loader: &'a mut DataLoader,
}

impl<'a> Iterator for DataLoaderIter<'a> {
    type Item = Array4<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        self.loader.next_batch()
    }
}

/// Copy an image batch into a float tensor on `device`, keeping the NHWC layout
pub fn batch_to_tensor(batch: &Array4<f32>, device: Device) -> Tensor {
    let dims: Vec<i64> = batch.shape().iter().map(|&d| d as i64).collect();
    let values: Vec<f32> = batch.iter().copied().collect();
    Tensor::from_slice(&values).view(dims.as_slice()).to_device(device)
}
