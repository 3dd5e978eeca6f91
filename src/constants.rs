// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Video encoder bitrate presets
///
/// These presets define the target bitrate for video encoding based on resolution.
/// The face sub-stream is small, so it always lands in the SD tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitratePreset {
    /// Low bitrate - smaller files, reduced quality
    Low,
    /// Medium bitrate - balanced quality and file size (default)
    #[default]
    Medium,
    /// High bitrate - larger files, better quality
    High,
}

impl BitratePreset {
    pub const ALL: [BitratePreset; 3] = [
        BitratePreset::Low,
        BitratePreset::Medium,
        BitratePreset::High,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            BitratePreset::Low => "Low",
            BitratePreset::Medium => "Medium",
            BitratePreset::High => "High",
        }
    }

    /// Get bitrate in kbps for a given resolution
    ///
    /// - SD (640x480 and below): Low=1, Medium=2, High=4 Mbps
    /// - HD (1280x720): Low=2.5, Medium=5, High=10 Mbps
    /// - Full HD (1920x1080): Low=4, Medium=8, High=16 Mbps
    /// - 4K (3840x2160): Low=15, Medium=30, High=50 Mbps
    pub fn bitrate_kbps(&self, width: u32, _height: u32) -> u32 {
        match (get_resolution_tier(width), self) {
            (ResolutionTier::SD, BitratePreset::Low) => 1_000,
            (ResolutionTier::SD, BitratePreset::Medium) => 2_000,
            (ResolutionTier::SD, BitratePreset::High) => 4_000,
            (ResolutionTier::HD, BitratePreset::Low) => 2_500,
            (ResolutionTier::HD, BitratePreset::Medium) => 5_000,
            (ResolutionTier::HD, BitratePreset::High) => 10_000,
            (ResolutionTier::FullHD, BitratePreset::Low) => 4_000,
            (ResolutionTier::FullHD, BitratePreset::Medium) => 8_000,
            (ResolutionTier::FullHD, BitratePreset::High) => 16_000,
            (ResolutionTier::FourK, BitratePreset::Low) => 15_000,
            (ResolutionTier::FourK, BitratePreset::Medium) => 30_000,
            (ResolutionTier::FourK, BitratePreset::High) => 50_000,
        }
    }
}

/// Resolution tiers for bitrate calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// SD: below 1280 wide
    SD,
    /// HD: 1280x720
    HD,
    /// Full HD: 1920x1080 up to 4K
    FullHD,
    /// 4K: 3840x2160 and above
    FourK,
}

/// Get the resolution tier for a given width
pub fn get_resolution_tier(width: u32) -> ResolutionTier {
    match width {
        w if w >= 3840 => ResolutionTier::FourK,
        w if w >= 1920 => ResolutionTier::FullHD,
        w if w >= 1280 => ResolutionTier::HD,
        _ => ResolutionTier::SD,
    }
}

/// Recording defaults
pub mod recording {
    /// Main stream frame rate
    pub const DEFAULT_MAIN_FPS: u32 = 30;

    /// Face sub-stream frame rate (deliberately low, the crop is a keepsake, not footage)
    pub const DEFAULT_FACE_FPS: u32 = 3;

    /// JPEG quality for still captures
    pub const DEFAULT_JPEG_QUALITY: u8 = 92;
}

/// Camera capture defaults
pub mod capture {
    pub const DEFAULT_DEVICE: &str = "/dev/video0";
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 720;
    /// Camera module is mounted upside down on the reference rig
    pub const DEFAULT_ROTATION_DEGREES: i32 = 180;

    /// Number of mmap buffers queued with the driver
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Frames buffered between the capture thread and the session loop
    pub const FRAME_QUEUE_DEPTH: usize = 2;

    /// Consecutive dequeue failures before the source is considered gone
    pub const MAX_CONSECUTIVE_FAILURES: u32 = 30;

    /// Frames discarded before a one-shot photo (auto exposure settling)
    pub const PHOTO_WARMUP_FRAMES: u32 = 15;
}

/// Face detector defaults
pub mod face {
    /// Smallest face considered, in pixels
    pub const DEFAULT_MIN_FACE_SIZE: u32 = 150;
    pub const DEFAULT_SCORE_THRESHOLD: f64 = 2.0;
    pub const DEFAULT_PYRAMID_SCALE_FACTOR: f32 = 0.8;
    pub const DEFAULT_SLIDE_WINDOW_STEP: u32 = 4;
}

/// Artifact directories, relative to the output root
pub mod output {
    pub const DEFAULT_FOLDER: &str = "facecam";
    pub const IMAGE_DIR: &str = "captured_images";
    pub const VIDEO_DIR: &str = "captured_videos";
    pub const FACE_IMAGE_DIR: &str = "captured_faces";
    pub const FACE_VIDEO_DIR: &str = "captured_faces";

    /// strftime pattern for artifact names (one-second resolution)
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
}

/// Overlay layout and colors (RGB)
pub mod overlay {
    pub const RECORDING_DOT_CENTER: (i32, i32) = (30, 30);
    pub const RECORDING_DOT_RADIUS: i32 = 10;
    pub const RECORDING_COLOR: [u8; 3] = [255, 0, 0];
    pub const FACE_BOX_COLOR: [u8; 3] = [0, 255, 0];
    pub const FACE_BOX_THICKNESS: u32 = 2;
    pub const TEXT_COLOR: [u8; 3] = [255, 255, 255];

    /// Key help; the first line is drawn bottom-most
    pub const HELP_LINES: [&str; 4] = [
        "Press 'r' to start/stop recording",
        "Press 'c' to capture image",
        "Press 'f' to toggle face mode",
        "Press 'q' to quit",
    ];
    pub const HELP_LINE_SPACING: u32 = 30;
    pub const HELP_BOTTOM_MARGIN: u32 = 30;

    pub const REC_LABEL_POSITION: (u32, u32) = (50, 22);
    pub const FACE_MODE_LABEL_POSITION: (u32, u32) = (10, 55);
    pub const NOTICE_LABEL_POSITION: (u32, u32) = (10, 90);
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 300;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT: Duration = Duration::from_secs(5);

    /// Upper bound on waiting for EOS to reach the muxer when finalizing
    pub const EOS_TIMEOUT: Duration = Duration::from_secs(5);

    /// Back-off after a failed buffer dequeue
    pub const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(10);

    /// Minimum spacing between repeated detector failure warnings
    pub const DETECTOR_WARN_INTERVAL: Duration = Duration::from_secs(5);

    /// How long a notice stays on screen
    pub const NOTICE_DURATION: Duration = Duration::from_secs(4);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_tiers() {
        assert_eq!(get_resolution_tier(640), ResolutionTier::SD);
        assert_eq!(get_resolution_tier(1280), ResolutionTier::HD);
        assert_eq!(get_resolution_tier(1920), ResolutionTier::FullHD);
        assert_eq!(get_resolution_tier(2560), ResolutionTier::FullHD);
        assert_eq!(get_resolution_tier(3840), ResolutionTier::FourK);
    }

    #[test]
    fn test_face_stream_bitrate_is_sd() {
        // A typical face crop is a few hundred pixels wide
        assert_eq!(BitratePreset::Medium.bitrate_kbps(220, 220), 2_000);
    }
}
