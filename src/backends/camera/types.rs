// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::app::frame_processor::FaceRect;
use chrono::{DateTime, Local};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size after rotating by `rotation`
    pub fn rotated(&self, rotation: SensorRotation) -> Self {
        if rotation.swaps_dimensions() {
            Self::new(self.height, self.width)
        } else {
            *self
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single RGB frame from the camera
///
/// Pixel data is packed RGB, 8 bits per channel, no row padding. Frames are
/// cheap to move and explicit to copy: the overlay path works on a `clone()`,
/// writers only ever see the untouched original.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Monotonic capture instant (elapsed-time math)
    pub captured_at: Instant,
    /// Wall-clock capture time (artifact names)
    pub timestamp: DateTime<Local>,
    /// Per-source sequence number, starting at 0
    pub sequence: u64,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
            timestamp: Local::now(),
            sequence,
        }
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.image.width(), self.image.height())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Copy the region under `rect` into a new frame with the same timestamps
    ///
    /// `rect` must lie inside the frame; [`FaceRect`] values produced by the
    /// locators are always clamped to frame bounds.
    pub fn crop(&self, rect: &FaceRect) -> Frame {
        let image =
            image::imageops::crop_imm(&self.image, rect.x, rect.y, rect.width, rect.height)
                .to_image();
        Frame {
            image,
            captured_at: self.captured_at,
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }
}

/// Rotation applied to every captured frame (clockwise)
///
/// Camera modules are often mounted upside down; the session works in the
/// rotated ("canonical") orientation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    #[default]
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    /// Values that are not a multiple of 90 map to `None`.
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, SensorRotation::Rotate90 | SensorRotation::Rotate270)
    }

    pub fn apply(&self, image: RgbImage) -> RgbImage {
        match self {
            SensorRotation::None => image,
            SensorRotation::Rotate90 => image::imageops::rotate90(&image),
            SensorRotation::Rotate180 => {
                let mut image = image;
                image::imageops::rotate180_in_place(&mut image);
                image
            }
            SensorRotation::Rotate270 => image::imageops::rotate270(&image),
        }
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A V4L2 capture device found during enumeration
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,
    pub driver: String,
    pub bus: String,
}

/// One supported (fourcc, size, rate) combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<u32>,
    /// FourCC code (e.g. "MJPG", "YUYV")
    pub pixel_format: String,
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = self.framerate {
            write!(
                f,
                "{} {}x{} @ {}fps",
                self.pixel_format, self.width, self.height, fps
            )
        } else {
            write!(f, "{} {}x{}", self.pixel_format, self.width, self.height)
        }
    }
}

/// Pixel formats the V4L2 source knows how to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PixelFormat {
    /// Motion JPEG, decoded with the `image` crate
    #[default]
    #[serde(rename = "MJPG")]
    Mjpeg,
    /// Packed 4:2:2 (Y0 U Y1 V)
    #[serde(rename = "YUYV")]
    Yuyv,
    /// Packed 24-bit RGB
    #[serde(rename = "RGB3")]
    Rgb24,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 3] = [PixelFormat::Mjpeg, PixelFormat::Yuyv, PixelFormat::Rgb24];

    pub fn fourcc(&self) -> &'static [u8; 4] {
        match self {
            PixelFormat::Mjpeg => b"MJPG",
            PixelFormat::Yuyv => b"YUYV",
            PixelFormat::Rgb24 => b"RGB3",
        }
    }

    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.fourcc() == fourcc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(SensorRotation::from_degrees_int(180), SensorRotation::Rotate180);
        assert_eq!(SensorRotation::from_degrees_int(-90), SensorRotation::Rotate270);
        assert_eq!(SensorRotation::from_degrees_int(450), SensorRotation::Rotate90);
        assert_eq!(SensorRotation::from_degrees_int(45), SensorRotation::None);
    }

    #[test]
    fn test_rotate_180_moves_top_left_to_bottom_right() {
        let mut image = RgbImage::new(4, 2);
        image.put_pixel(0, 0, image::Rgb([255, 0, 0]));

        let rotated = SensorRotation::Rotate180.apply(image);
        assert_eq!(rotated.dimensions(), (4, 2));
        assert_eq!(rotated.get_pixel(3, 1).0, [255, 0, 0]);
        assert_eq!(rotated.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_rotate_90_swaps_size() {
        let size = FrameSize::new(1280, 720);
        assert_eq!(size.rotated(SensorRotation::Rotate90), FrameSize::new(720, 1280));
        assert_eq!(size.rotated(SensorRotation::Rotate180), size);

        let rotated = SensorRotation::Rotate90.apply(RgbImage::new(4, 2));
        assert_eq!(rotated.dimensions(), (2, 4));
    }

    #[test]
    fn test_crop_copies_region() {
        let mut image = RgbImage::new(10, 10);
        image.put_pixel(3, 4, image::Rgb([1, 2, 3]));
        let frame = Frame::new(image, 7);

        let crop = frame.crop(&FaceRect::new(3, 4, 2, 2));
        assert_eq!(crop.size(), FrameSize::new(2, 2));
        assert_eq!(crop.image.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(crop.sequence, 7);
    }

    #[test]
    fn test_pixel_format_fourcc_lookup() {
        assert_eq!(PixelFormat::from_fourcc(b"YUYV"), Some(PixelFormat::Yuyv));
        assert_eq!(PixelFormat::from_fourcc(b"H264"), None);
    }
}
