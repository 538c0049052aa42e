//! Rendering of image batches to PNG files
//!
//! Batches are laid out row-major in a grid with a dark border between cells.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::Array3;
use tch::{Device, Tensor};

use crate::data::to_display_range;
use crate::error::{DcganError, Result};

/// Pixels of border around every grid cell
pub const GRID_PADDING: u32 = 2;

/// u8 pixels of a batch laid out as (num_images, height, width, channels)
#[derive(Debug, Clone)]
pub struct PixelBatch {
    pub pixels: Vec<u8>,
    pub num_images: usize,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl PixelBatch {
    /// Convert a generated (N, H, W, C) tensor in [-1, 1] to display pixels
    pub fn from_tensor(images: &Tensor) -> Result<Self> {
        let size = images.size();
        if size.len() != 4 {
            return Err(DcganError::shape_mismatch(&[-1, -1, -1, -1], &size));
        }
        let display = to_display_range(images).to_device(Device::Cpu).contiguous();
        let pixels = Vec::<u8>::try_from(&display.flatten(0, -1))?;

        Ok(Self {
            pixels,
            num_images: size[0] as usize,
            height: size[1] as usize,
            width: size[2] as usize,
            channels: size[3] as usize,
        })
    }

    /// Wrap raw dataset images of shape (N, H, W)
    pub fn from_grayscale(images: &Array3<u8>) -> Self {
        let shape = images.shape();
        Self {
            pixels: images.iter().copied().collect(),
            num_images: shape[0],
            height: shape[1],
            width: shape[2],
            channels: 1,
        }
    }

    fn image_len(&self) -> usize {
        self.height * self.width * self.channels
    }

    /// Pixels of a single image
    pub fn image(&self, index: usize) -> &[u8] {
        let len = self.image_len();
        &self.pixels[index * len..(index + 1) * len]
    }

    /// Render the first `count` images into a grid with `cols` columns
    pub fn to_grid(&self, count: usize, cols: usize) -> Result<DynamicImage> {
        if cols == 0 {
            return Err(DcganError::Config("grid needs at least one column".to_string()));
        }
        let count = count.min(self.num_images);
        let rows = count.div_ceil(cols).max(1);

        let cell_w = self.width as u32 + GRID_PADDING;
        let cell_h = self.height as u32 + GRID_PADDING;
        let grid_w = cols as u32 * cell_w + GRID_PADDING;
        let grid_h = rows as u32 * cell_h + GRID_PADDING;

        let mut canvas = Canvas::new(self.channels, grid_w, grid_h)?;
        for index in 0..count {
            let x0 = GRID_PADDING + (index % cols) as u32 * cell_w;
            let y0 = GRID_PADDING + (index / cols) as u32 * cell_h;
            canvas.blit(self, index, x0, y0);
        }

        Ok(canvas.into_image())
    }

    /// Render a single image
    pub fn to_image(&self, index: usize) -> Result<DynamicImage> {
        let mut canvas = Canvas::new(self.channels, self.width as u32, self.height as u32)?;
        canvas.blit(self, index, 0, 0);
        Ok(canvas.into_image())
    }
}

enum Canvas {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl Canvas {
    fn new(channels: usize, width: u32, height: u32) -> Result<Self> {
        match channels {
            1 => Ok(Self::Gray(GrayImage::new(width, height))),
            3 => Ok(Self::Rgb(RgbImage::new(width, height))),
            other => Err(DcganError::InvalidDataset(format!(
                "cannot render images with {other} channels"
            ))),
        }
    }

    fn blit(&mut self, batch: &PixelBatch, index: usize, x0: u32, y0: u32) {
        let src = batch.image(index);
        for y in 0..batch.height {
            for x in 0..batch.width {
                let offset = (y * batch.width + x) * batch.channels;
                let (px, py) = (x0 + x as u32, y0 + y as u32);
                match self {
                    Self::Gray(img) => img.put_pixel(px, py, image::Luma([src[offset]])),
                    Self::Rgb(img) => img.put_pixel(
                        px,
                        py,
                        image::Rgb([src[offset], src[offset + 1], src[offset + 2]]),
                    ),
                }
            }
        }
    }

    fn into_image(self) -> DynamicImage {
        match self {
            Self::Gray(img) => DynamicImage::ImageLuma8(img),
            Self::Rgb(img) => DynamicImage::ImageRgb8(img),
        }
    }
}

/// Render generated images into a grid and save it as PNG
pub fn save_grid<P: AsRef<Path>>(images: &Tensor, count: usize, cols: usize, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    PixelBatch::from_tensor(images)?.to_grid(count, cols)?.save(path)?;
    Ok(())
}

/// Save every image of a batch as a numbered frame `frame_001.png`, `frame_002.png`, ...
pub fn save_frames<P: AsRef<Path>>(images: &Tensor, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let batch = PixelBatch::from_tensor(images)?;
    (0..batch.num_images)
        .map(|i| -> Result<PathBuf> {
            let path = dir.join(format!("frame_{:03}.png", i + 1));
            batch.to_image(i)?.save(&path)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Kind;

    #[test]
    fn test_grid_dimensions() {
        let images = Tensor::zeros([16, 28, 28, 1], (Kind::Float, Device::Cpu));
        let grid = PixelBatch::from_tensor(&images).unwrap().to_grid(16, 4).unwrap();

        // 4 cells of 28 px plus 5 borders of 2 px
        assert_eq!(grid.width(), 4 * 30 + 2);
        assert_eq!(grid.height(), 4 * 30 + 2);
    }

    #[test]
    fn test_partial_last_row() {
        let images = Tensor::zeros([3, 8, 8, 1], (Kind::Float, Device::Cpu));
        let grid = PixelBatch::from_tensor(&images).unwrap().to_grid(10, 2).unwrap();

        assert_eq!(grid.width(), 2 * 10 + 2);
        assert_eq!(grid.height(), 2 * 10 + 2);
    }

    #[test]
    fn test_pixels_rescaled() {
        let images = Tensor::ones([1, 2, 2, 1], (Kind::Float, Device::Cpu));
        let batch = PixelBatch::from_tensor(&images).unwrap();
        assert_eq!(batch.image(0), &[255, 255, 255, 255]);

        let grid = batch.to_grid(1, 1).unwrap().to_luma8();
        assert_eq!(grid.get_pixel(0, 0).0, [0]);
        assert_eq!(grid.get_pixel(2, 2).0, [255]);
    }

    #[test]
    fn test_rgb_and_unsupported_channels() {
        let rgb = Tensor::zeros([2, 4, 4, 3], (Kind::Float, Device::Cpu));
        assert!(PixelBatch::from_tensor(&rgb).unwrap().to_grid(2, 2).is_ok());

        let two = Tensor::zeros([2, 4, 4, 2], (Kind::Float, Device::Cpu));
        assert!(PixelBatch::from_tensor(&two).unwrap().to_grid(2, 2).is_err());
    }

    #[test]
    fn test_save_grid_and_frames() {
        let dir = tempfile::tempdir().unwrap();
        let images = Tensor::rand([3, 28, 28, 1], (Kind::Float, Device::Cpu)) * 2.0 - 1.0;

        let grid_path = dir.path().join("samples").join("grid.png");
        save_grid(&images, 3, 4, &grid_path).unwrap();
        assert!(grid_path.exists());

        let frames = save_frames(&images, dir.path().join("frames")).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[2].ends_with("frame_003.png"));
        assert!(frames.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_from_grayscale() {
        let images = Array3::<u8>::from_elem((12, 28, 28), 9);
        let grid = PixelBatch::from_grayscale(&images).to_grid(12, 4).unwrap();
        assert_eq!(grid.height(), 3 * 30 + 2);
    }
}
