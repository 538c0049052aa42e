//! Fashion-MNIST loader
//!
//! Reads the four IDX files of an MNIST-layout dataset from a directory.
//! Each file may be stored raw or gzip-compressed (`<name>.gz`).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use ndarray::{Array3, ArrayView2, Axis};
use tracing::{debug, info};

use crate::error::{DcganError, Result};

/// Magic number of an IDX file holding unsigned-byte rank-3 data
pub const IMAGES_MAGIC: u32 = 0x0000_0803;
/// Magic number of an IDX file holding unsigned-byte rank-1 data
pub const LABELS_MAGIC: u32 = 0x0000_0801;

/// Human readable names of the ten Fashion-MNIST classes
pub const CLASS_NAMES: [&str; 10] = [
    "T-shirt/top",
    "Trouser",
    "Pullover",
    "Dress",
    "Coat",
    "Sandal",
    "Shirt",
    "Sneaker",
    "Bag",
    "Ankle boot",
];

/// Name of a class label, if it is in range
pub fn class_name(label: u8) -> Option<&'static str> {
    CLASS_NAMES.get(label as usize).copied()
}

/// A labeled set of grayscale images
#[derive(Debug, Clone)]
pub struct ImageDataset {
    /// Pixels, shape (num_images, height, width)
    pub images: Array3<u8>,
    /// One label per image
    pub labels: Vec<u8>,
}

impl ImageDataset {
    /// Pair images with labels, checking the counts agree
    pub fn new(images: Array3<u8>, labels: Vec<u8>) -> Result<Self> {
        if images.shape()[0] != labels.len() {
            return Err(DcganError::InvalidDataset(format!(
                "image count ({}) does not match label count ({})",
                images.shape()[0],
                labels.len()
            )));
        }
        Ok(Self { images, labels })
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Image height and width
    pub fn image_size(&self) -> (usize, usize) {
        (self.images.shape()[1], self.images.shape()[2])
    }

    /// View of a single image
    pub fn image(&self, index: usize) -> ArrayView2<'_, u8> {
        self.images.index_axis(Axis(0), index)
    }
}

/// Train and test splits of Fashion-MNIST
#[derive(Debug, Clone)]
pub struct FashionMnist {
    pub train: ImageDataset,
    pub test: ImageDataset,
}

impl FashionMnist {
    /// Load both splits from `dir`
    ///
    /// Expected files (each optionally with a `.gz` suffix):
    /// - train-images-idx3-ubyte
    /// - train-labels-idx1-ubyte
    /// - t10k-images-idx3-ubyte
    /// - t10k-labels-idx1-ubyte
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        info!("Loading dataset from {}", dir.display());

        let train = load_split(dir, "train-images-idx3-ubyte", "train-labels-idx1-ubyte")?;
        let test = load_split(dir, "t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte")?;

        info!(
            "Loaded {} training and {} test images of size {:?}",
            train.len(),
            test.len(),
            train.image_size()
        );

        Ok(Self { train, test })
    }

    /// Load only the training split, which is all the GAN consumes
    pub fn load_train<P: AsRef<Path>>(dir: P) -> Result<ImageDataset> {
        load_split(dir.as_ref(), "train-images-idx3-ubyte", "train-labels-idx1-ubyte")
    }
}

fn load_split(dir: &Path, images_name: &str, labels_name: &str) -> Result<ImageDataset> {
    let images = read_idx_images(open_idx(dir, images_name)?)?;
    let labels = read_idx_labels(open_idx(dir, labels_name)?)?;
    ImageDataset::new(images, labels)
}

/// Open an IDX file, preferring the gzipped variant when both exist
fn open_idx(dir: &Path, base_name: &str) -> Result<Box<dyn Read>> {
    let gz_path = dir.join(format!("{base_name}.gz"));
    if gz_path.exists() {
        debug!("Reading {}", gz_path.display());
        return Ok(Box::new(GzDecoder::new(File::open(gz_path)?)));
    }

    let path: PathBuf = dir.join(base_name);
    if path.exists() {
        debug!("Reading {}", path.display());
        return Ok(Box::new(File::open(path)?));
    }

    Err(DcganError::InvalidDataset(format!(
        "could not find {base_name} or {base_name}.gz in {}",
        dir.display()
    )))
}

/// Parse an IDX image file into a (num_images, rows, cols) array
pub fn read_idx_images<R: Read>(mut reader: R) -> Result<Array3<u8>> {
    let magic = reader.read_u32::<BigEndian>()?;
    if magic != IMAGES_MAGIC {
        return Err(DcganError::InvalidDataset(format!(
            "invalid magic number for images: {magic}"
        )));
    }

    let num_images = reader.read_u32::<BigEndian>()? as usize;
    let rows = reader.read_u32::<BigEndian>()? as usize;
    let cols = reader.read_u32::<BigEndian>()? as usize;

    let len = num_images
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(cols))
        .ok_or_else(|| {
            DcganError::InvalidDataset(format!(
                "image header {num_images}x{rows}x{cols} is too large"
            ))
        })?;
    let pixels = read_body(reader, len, "image")?;

    Array3::from_shape_vec((num_images, rows, cols), pixels)
        .map_err(|e| DcganError::InvalidDataset(e.to_string()))
}

/// Parse an IDX label file
pub fn read_idx_labels<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let magic = reader.read_u32::<BigEndian>()?;
    if magic != LABELS_MAGIC {
        return Err(DcganError::InvalidDataset(format!(
            "invalid magic number for labels: {magic}"
        )));
    }

    let num_labels = reader.read_u32::<BigEndian>()? as usize;
    read_body(reader, num_labels, "label")
}

/// Read exactly `len` payload bytes
///
/// The buffer grows with the data actually present, so a header claiming
/// more bytes than the file holds fails without allocating for the claim.
fn read_body<R: Read>(reader: R, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    reader.take(len as u64).read_to_end(&mut body)?;
    if body.len() != len {
        return Err(DcganError::InvalidDataset(format!(
            "{what} file truncated: header declares {len} bytes, found {}",
            body.len()
        )));
    }
    Ok(body)
}
