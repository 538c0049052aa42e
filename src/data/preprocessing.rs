//! Pixel preprocessing for GAN training
//!
//! The generator ends in `tanh`, so real images are moved into the same
//! [-1, 1] range before training:
//!
//! `x_norm = (x - 127.5) / 127.5`
//!
//! and generated images are brought back for display with the inverse map
//! `x = x_norm * 127.5 + 127.5`.

use ndarray::{Array3, Array4, Axis};
use tch::{Kind, Tensor};

/// Center of the u8 pixel range
pub const PIXEL_SCALE: f32 = 127.5;

/// Normalize (N, H, W) u8 images to (N, H, W, 1) f32 in [-1, 1]
pub fn normalize_images(images: &Array3<u8>) -> Array4<f32> {
    images
        .mapv(|p| (f32::from(p) - PIXEL_SCALE) / PIXEL_SCALE)
        .insert_axis(Axis(3))
}

/// Rescale a generated image tensor from [-1, 1] to the u8 display range
pub fn to_display_range(images: &Tensor) -> Tensor {
    (images * f64::from(PIXEL_SCALE) + f64::from(PIXEL_SCALE))
        .round()
        .clamp(0.0, 255.0)
        .to_kind(Kind::Uint8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use tch::Device;

    #[test]
    fn test_normalize_range() {
        let images = array![[[0u8, 255], [127, 128]]];
        let normalized = normalize_images(&images);

        assert_eq!(normalized.shape(), &[1, 2, 2, 1]);
        assert_relative_eq!(normalized[[0, 0, 0, 0]], -1.0);
        assert_relative_eq!(normalized[[0, 0, 1, 0]], 1.0);
        assert!(normalized.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_display_range_inverts_normalization() {
        let images = Array3::from_shape_fn((2, 4, 4), |(n, r, c)| ((n * 16 + r * 4 + c) * 8) as u8);
        let normalized: Vec<f32> = normalize_images(&images).iter().copied().collect();
        let restored = Vec::<u8>::try_from(&to_display_range(&Tensor::from_slice(&normalized))).unwrap();

        assert_eq!(restored, images.iter().copied().collect::<Vec<u8>>());
    }

    #[test]
    fn test_display_range_clamps() {
        let t = Tensor::from_slice(&[-3.0f32, 3.0]);
        assert_eq!(Vec::<u8>::try_from(&to_display_range(&t)).unwrap(), vec![0, 255]);
    }

    #[test]
    fn test_to_display_range() {
        let t = Tensor::from_slice(&[-1.0f32, 0.0, 1.0]);
        let display = to_display_range(&t);
        assert_eq!(display.kind(), Kind::Uint8);

        let values = Vec::<u8>::try_from(&display.to_device(Device::Cpu)).unwrap();
        assert_eq!(values, vec![0, 128, 255]);
    }
}
