// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for captured V4L2 buffers
//!
//! Every converter produces a tightly packed RGB buffer of exactly
//! `width * height * 3` bytes, or an error when the input is too short.

use super::types::PixelFormat;
use crate::errors::SourceError;
use image::RgbImage;

/// Decode a raw capture buffer into an RGB image
///
/// `stride` is the bytes-per-line reported by the driver (ignored for MJPEG).
pub fn decode_buffer(
    data: &[u8],
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: u32,
) -> Result<RgbImage, SourceError> {
    match format {
        PixelFormat::Mjpeg => decode_mjpeg(data, width, height),
        PixelFormat::Yuyv => {
            let rgb = yuyv_to_rgb(data, width, height, stride)?;
            into_image(rgb, width, height)
        }
        PixelFormat::Rgb24 => {
            let rgb = strip_stride(data, width, height, stride, 3)?;
            into_image(rgb, width, height)
        }
    }
}

fn into_image(rgb: Vec<u8>, width: u32, height: u32) -> Result<RgbImage, SourceError> {
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| SourceError::Decode(format!("buffer does not match {}x{}", width, height)))
}

/// Decode one MJPEG frame
///
/// Some UVC cameras emit JPEGs whose size differs from the negotiated format
/// for the first few frames; those are rejected so the session keeps a fixed size.
pub fn decode_mjpeg(data: &[u8], width: u32, height: u32) -> Result<RgbImage, SourceError> {
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| SourceError::Decode(format!("MJPEG: {}", e)))?
        .to_rgb8();

    if decoded.dimensions() != (width, height) {
        return Err(SourceError::Decode(format!(
            "MJPEG frame is {}x{}, expected {}x{}",
            decoded.width(),
            decoded.height(),
            width,
            height
        )));
    }
    Ok(decoded)
}

/// Convert YUYV (YUV 4:2:2) to packed RGB
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32, stride: u32) -> Result<Vec<u8>, SourceError> {
    let w = width as usize;
    let h = height as usize;
    let row_bytes = w * 2;
    let stride = (stride as usize).max(row_bytes);

    if data.len() < stride * (h.saturating_sub(1)) + row_bytes {
        return Err(SourceError::Decode(format!(
            "YUYV buffer too short: {} bytes for {}x{}",
            data.len(),
            width,
            height
        )));
    }

    let mut rgb = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let line = &data[row * stride..row * stride + row_bytes];
        let pairs = line.chunks_exact(4);
        let rest = pairs.remainder();
        for chunk in pairs {
            let y0 = chunk[0];
            let u = chunk[1];
            let y1 = chunk[2];
            let v = chunk[3];
            rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
            rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
        }
        // odd widths leave a trailing Y U half pair
        if let [y, u] = rest {
            rgb.extend_from_slice(&yuv_to_rgb(*y, *u, 128));
        }
    }
    Ok(rgb)
}

/// Remove per-row padding from a packed buffer with `bpp` bytes per pixel
pub fn strip_stride(
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
    bpp: usize,
) -> Result<Vec<u8>, SourceError> {
    let row_bytes = width as usize * bpp;
    let stride = (stride as usize).max(row_bytes);
    let h = height as usize;

    if data.len() < stride * h.saturating_sub(1) + row_bytes {
        return Err(SourceError::Decode(format!(
            "buffer too short: {} bytes for {}x{}",
            data.len(),
            width,
            height
        )));
    }

    if stride == row_bytes {
        return Ok(data[..row_bytes * h].to_vec());
    }

    let mut out = Vec::with_capacity(row_bytes * h);
    for row in 0..h {
        out.extend_from_slice(&data[row * stride..row * stride + row_bytes]);
    }
    Ok(out)
}

/// Convert YUV (BT.601) to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    [r, g, b]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_gray() {
        // Neutral chroma -> gray pixels equal to luma
        let data = [100u8, 128, 200, 128];
        let rgb = yuyv_to_rgb(&data, 2, 1, 4).unwrap();
        assert_eq!(rgb, vec![100, 100, 100, 200, 200, 200]);
    }

    #[test]
    fn test_yuyv_respects_stride() {
        // 2x2 image, 4 bytes of padding per row
        let data = [
            10u8, 128, 20, 128, 0, 0, 0, 0, //
            30, 128, 40, 128, 0, 0, 0, 0,
        ];
        let rgb = yuyv_to_rgb(&data, 2, 2, 8).unwrap();
        assert_eq!(rgb.len(), 12);
        assert_eq!(rgb[6], 30);
        assert_eq!(rgb[9], 40);
    }

    #[test]
    fn test_yuyv_short_buffer_is_error() {
        assert!(yuyv_to_rgb(&[0u8; 6], 2, 2, 4).is_err());
    }

    #[test]
    fn test_strip_stride() {
        let data = [1u8, 2, 3, 9, 4, 5, 6, 9];
        let out = strip_stride(&data, 1, 2, 4, 3).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_mjpeg_roundtrip_size_check() {
        let image = RgbImage::from_pixel(8, 8, image::Rgb([200, 10, 10]));
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new(&mut jpeg)
            .encode(image.as_raw(), 8, 8, image::ExtendedColorType::Rgb8)
            .unwrap();

        assert!(decode_mjpeg(&jpeg, 8, 8).is_ok());
        assert!(decode_mjpeg(&jpeg, 16, 8).is_err());
    }
}
