// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Stills are written as JPEG with a configurable quality.

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use std::path::Path;
use tracing::{debug, info};

/// File extension for stills
pub const IMAGE_EXTENSION: &str = "jpg";

/// JPEG photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: u8,
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new(crate::constants::recording::DEFAULT_JPEG_QUALITY)
    }
}

impl PhotoEncoder {
    /// Create an encoder; quality is clamped to 1-100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode to JPEG bytes
    pub fn encode_jpeg(&self, image: &RgbImage) -> Result<Vec<u8>, String> {
        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, self.quality)
            .encode_image(image)
            .map_err(|e| format!("JPEG encoding failed: {}", e))?;
        debug!(
            width = image.width(),
            height = image.height(),
            bytes = data.len(),
            quality = self.quality,
            "Encoded JPEG"
        );
        Ok(data)
    }

    /// Encode and write to `path`
    pub fn save(&self, image: &RgbImage, path: &Path) -> Result<(), String> {
        let data = self.encode_jpeg(image)?;
        std::fs::write(path, &data)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        info!(path = %path.display(), "Photo saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(PhotoEncoder::new(0).quality(), 1);
        assert_eq!(PhotoEncoder::new(200).quality(), 100);
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let image = RgbImage::from_pixel(16, 8, image::Rgb([10, 200, 30]));
        let data = PhotoEncoder::default().encode_jpeg(&image).unwrap();
        // SOI marker
        assert_eq!(&data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }
}
