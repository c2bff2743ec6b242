//! Heightmap sampler
//!
//! Elevation comes from the red channel of a grayscale image. Gray levels
//! are stored sRGB-encoded, so they are linearized before use; otherwise the
//! displacement would be nonlinear in the stored gray level.

use std::path::Path;

use super::sampling::{srgb8_to_linear, TexelGrid};
use super::texture_image::TextureImage;
use crate::error::TextureError;

/// Linear elevation samples in `[0, 1]` together with the source image
#[derive(Debug, Clone)]
pub struct Heightmap {
    image: TextureImage,
    samples: TexelGrid<f32>,
}

impl Heightmap {
    pub fn load(path: &Path) -> Result<Self, TextureError> {
        Ok(Self::from_image(TextureImage::load(path)?))
    }

    pub fn from_image(image: TextureImage) -> Self {
        let samples = image
            .rgba
            .chunks_exact(4)
            .map(|texel| srgb8_to_linear(texel[0]))
            .collect();
        let samples = TexelGrid::new(image.width, image.height, samples)
            .unwrap_or_else(|| TexelGrid::filled(1, 1, 0.0));
        Self { image, samples }
    }

    /// Builds a heightmap from already-linear intensities.
    ///
    /// The companion image is re-encoded to sRGB so a GPU upload decodes back
    /// to (approximately) the same values.
    pub fn from_linear(width: u32, height: u32, values: Vec<f32>) -> Option<Self> {
        let samples = TexelGrid::new(width, height, values)?;
        let gray: Vec<u8> = (0..height as i64)
            .flat_map(|y| (0..width as i64).map(move |x| (x, y)))
            .map(|(x, y)| linear_to_srgb8(samples.texel_wrapped(x, y)))
            .collect();
        let image = TextureImage::from_gray("heightmap", width, height, &gray).ok()?;
        Some(Self { image, samples })
    }

    /// Constant elevation everywhere
    pub fn uniform(intensity: f32) -> Self {
        let gray = linear_to_srgb8(intensity);
        let image = TextureImage::solid("heightmap", 1, 1, [gray, gray, gray, 255]);
        Self {
            image,
            samples: TexelGrid::filled(1, 1, intensity),
        }
    }

    /// Linear elevation at `uv`, repeat-addressed and bilinear filtered
    pub fn sample(&self, uv: [f32; 2]) -> f32 {
        self.samples.sample_bilinear(uv)
    }

    pub fn image(&self) -> &TextureImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.samples.width(), self.samples.height())
    }
}

fn linear_to_srgb8(value: f32) -> u8 {
    let c = value.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_levels_are_linearized() {
        let image = TextureImage::from_gray("h", 2, 1, &[0, 255]).unwrap();
        let heightmap = Heightmap::from_image(image);
        assert_eq!(heightmap.sample([0.25, 0.5]), 0.0);
        assert!((heightmap.sample([0.75, 0.5]) - 1.0).abs() < 1e-6);

        let mid = Heightmap::from_image(TextureImage::from_gray("h", 1, 1, &[128]).unwrap());
        // encoded mid-gray is much darker than 0.5 once decoded
        assert!((mid.sample([0.5, 0.5]) - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn from_linear_keeps_exact_samples() {
        let heightmap = Heightmap::from_linear(1, 1, vec![0.5]).unwrap();
        assert_eq!(heightmap.sample([0.1, 0.9]), 0.5);
        // the companion image round-trips through sRGB
        let decoded = srgb8_to_linear(heightmap.image().texel(0, 0)[0]);
        assert!((decoded - 0.5).abs() < 0.01);
    }

    #[test]
    fn uniform_heightmap_is_constant() {
        let heightmap = Heightmap::uniform(0.25);
        assert_eq!(heightmap.dimensions(), (1, 1));
        for uv in [[0.0, 0.0], [0.4, 0.6], [3.3, -2.1]] {
            assert_eq!(heightmap.sample(uv), 0.25);
        }
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(Heightmap::from_linear(2, 2, vec![0.0; 3]).is_none());
    }
}
