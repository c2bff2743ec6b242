//! Decoded raster images
//!
//! [`TextureImage`] is the CPU-side form of every image the viewer loads:
//! tightly packed, sRGB-encoded RGBA8. The same bytes feed both the GPU
//! upload and the CPU samplers, so both paths see identical texels.

use std::path::Path;

use crate::error::TextureError;

/// An sRGB-encoded RGBA8 image
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    /// Decodes an image file of any format the `image` crate understands
    pub fn load(path: &Path) -> Result<Self, TextureError> {
        let decoded = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::info!("Decoded {} ({}x{})", path.display(), width, height);

        Self::from_rgba(&path.display().to_string(), width, height, rgba.into_raw())
    }

    /// Wraps an already decoded RGBA8 buffer
    pub fn from_rgba(
        label: &str,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(label.to_string()));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            label: label.to_string(),
            width,
            height,
            rgba,
        })
    }

    /// Builds a grayscale image from 8-bit sRGB gray levels
    pub fn from_gray(label: &str, width: u32, height: u32, gray: &[u8]) -> Result<Self, TextureError> {
        let rgba = gray.iter().flat_map(|&g| [g, g, g, 255]).collect();
        Self::from_rgba(label, width, height, rgba)
    }

    /// A single-color image
    pub fn solid(label: &str, width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width.max(1) as usize * height.max(1) as usize * 4)
            .collect();
        Self {
            label: label.to_string(),
            width: width.max(1),
            height: height.max(1),
            rgba,
        }
    }

    /// RGBA bytes of the texel at integer coordinates
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }
}
