// SPDX-License-Identifier: GPL-3.0-only

//! Output pipelines for stills and recordings
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │  Raw Frame   │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG File   │
//! │    (RGB)     │     │  - JPEG encoding  │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │  Raw Frames  │ ──▶ │  Video Pipeline   │ ──▶ │   MP4 File   │
//! │    (RGB)     │     │  - GStreamer      │     │              │
//! │              │     │  - H.264 encoding │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! [`session::OutputSession`] owns the open writers and their lifecycle; the
//! [`Encoder`] trait is the seam between it and the actual codecs.

pub mod photo;
pub mod session;
pub mod video;

use crate::backends::camera::types::{Frame, FrameSize};
use crate::constants::BitratePreset;
use std::path::Path;

/// An open video file accepting frames of one fixed size
pub trait VideoWriter {
    fn write(&mut self, frame: &Frame) -> Result<(), String>;

    /// Flush and close the file
    fn finish(self) -> Result<(), String>
    where
        Self: Sized;
}

/// Creates video writers and writes stills
pub trait Encoder {
    type Writer: VideoWriter;

    /// Extension of recorded video files (without the dot)
    fn video_extension(&self) -> &str;

    /// Extension of still images (without the dot)
    fn image_extension(&self) -> &str {
        photo::IMAGE_EXTENSION
    }

    fn open_video(&mut self, path: &Path, size: FrameSize, fps: u32)
    -> Result<Self::Writer, String>;

    fn write_image(&mut self, path: &Path, frame: &Frame) -> Result<(), String>;
}

/// GStreamer recordings plus JPEG stills
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaEncoder {
    bitrate: BitratePreset,
    photo: photo::PhotoEncoder,
}

impl MediaEncoder {
    pub fn new(bitrate: BitratePreset, jpeg_quality: u8) -> Self {
        Self {
            bitrate,
            photo: photo::PhotoEncoder::new(jpeg_quality),
        }
    }
}

impl Encoder for MediaEncoder {
    type Writer = video::GstVideoWriter;

    fn video_extension(&self) -> &str {
        video::CONTAINER_EXTENSION
    }

    fn open_video(
        &mut self,
        path: &Path,
        size: FrameSize,
        fps: u32,
    ) -> Result<Self::Writer, String> {
        video::GstVideoWriter::create(path, size, fps, self.bitrate)
    }

    fn write_image(&mut self, path: &Path, frame: &Frame) -> Result<(), String> {
        self.photo.save(&frame.image, path)
    }
}
