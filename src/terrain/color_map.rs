//! Surface color texture

use std::path::Path;
use std::sync::OnceLock;

use super::sampling::{srgb8_to_linear, TexelGrid};
use super::texture_image::TextureImage;
use crate::error::TextureError;

/// sRGB color image; the linear sample grid is decoded on the first CPU sample
#[derive(Debug, Clone)]
pub struct ColorMap {
    image: TextureImage,
    samples: OnceLock<TexelGrid<[f32; 3]>>,
}

impl ColorMap {
    pub fn load(path: &Path) -> Result<Self, TextureError> {
        Ok(Self::from_image(TextureImage::load(path)?))
    }

    pub fn from_image(image: TextureImage) -> Self {
        Self {
            image,
            samples: OnceLock::new(),
        }
    }

    pub fn solid(color: [u8; 3]) -> Self {
        Self::from_image(TextureImage::solid(
            "color_map",
            1,
            1,
            [color[0], color[1], color[2], 255],
        ))
    }

    /// Linear RGB at `uv`, repeat-addressed and bilinear filtered
    pub fn sample(&self, uv: [f32; 2]) -> [f32; 3] {
        self.samples
            .get_or_init(|| linear_grid(&self.image))
            .sample_bilinear(uv)
    }

    /// Whether a CPU sample has decoded the linear grid yet
    pub fn is_decoded(&self) -> bool {
        self.samples.get().is_some()
    }

    pub fn image(&self) -> &TextureImage {
        &self.image
    }
}

fn linear_grid(image: &TextureImage) -> TexelGrid<[f32; 3]> {
    let samples = image
        .rgba
        .chunks_exact(4)
        .map(|t| [srgb8_to_linear(t[0]), srgb8_to_linear(t[1]), srgb8_to_linear(t[2])])
        .collect();
    TexelGrid::new(image.width, image.height, samples)
        .unwrap_or_else(|| TexelGrid::filled(1, 1, [0.0; 3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_grid_is_decoded_on_first_sample() {
        let map = ColorMap::from_image(TextureImage::solid("c", 4, 4, [255, 188, 0, 255]));
        assert!(!map.is_decoded());

        let [r, g, b] = map.sample([0.3, 0.6]);
        assert!(map.is_decoded());
        assert!((r - 1.0).abs() < 1e-6);
        assert!((g - srgb8_to_linear(188)).abs() < 1e-6);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn gpu_upload_keeps_the_encoded_image() {
        let map = ColorMap::solid([12, 34, 56]);
        assert_eq!(map.image().texel(0, 0), [12, 34, 56, 255]);
        assert!(!map.is_decoded());
    }
}
