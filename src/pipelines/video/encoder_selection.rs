// SPDX-License-Identifier: GPL-3.0-only

//! H.264 encoder discovery and configuration
//!
//! Recordings are H.264 in MP4. Candidates are probed through the GStreamer
//! registry; the recorder tries them in priority order until one of them
//! reaches the Playing state, so a hardware encoder that rejects a small
//! face stream falls through to software.

use crate::constants::BitratePreset;
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::debug;

/// Container written by every recording
pub const CONTAINER_EXTENSION: &str = "mp4";
pub const MUXER_NAME: &str = "mp4mux";
pub const PARSER_NAME: &str = "h264parse";

/// Information about an available encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderInfo {
    /// GStreamer element name
    pub element_name: &'static str,
    /// Display name for logs and `facecam list`
    pub display_name: &'static str,
    pub is_hardware: bool,
    /// Priority (lower = tried first)
    pub priority: u32,
}

const CANDIDATES: [EncoderInfo; 7] = [
    EncoderInfo {
        element_name: "vah264enc",
        display_name: "VA-API H.264 (HW)",
        is_hardware: true,
        priority: 10,
    },
    EncoderInfo {
        element_name: "vaapih264enc",
        display_name: "VA-API H.264 (HW, legacy)",
        is_hardware: true,
        priority: 11,
    },
    EncoderInfo {
        element_name: "nvh264enc",
        display_name: "NVIDIA H.264 (HW)",
        is_hardware: true,
        priority: 12,
    },
    EncoderInfo {
        element_name: "qsvh264enc",
        display_name: "Intel QSV H.264 (HW)",
        is_hardware: true,
        priority: 13,
    },
    EncoderInfo {
        element_name: "v4l2h264enc",
        display_name: "V4L2 H.264 (HW)",
        is_hardware: true,
        priority: 14,
    },
    EncoderInfo {
        element_name: "x264enc",
        display_name: "x264 H.264 (SW)",
        is_hardware: false,
        priority: 50,
    },
    EncoderInfo {
        element_name: "openh264enc",
        display_name: "OpenH264 H.264 (SW)",
        is_hardware: false,
        priority: 51,
    },
];

/// Enumerate H.264 encoders installed on this system, best first
pub fn available_encoders() -> Vec<EncoderInfo> {
    if let Err(e) = gst::init() {
        debug!(error = %e, "GStreamer init failed, no encoders");
        return Vec::new();
    }

    let mut found: Vec<EncoderInfo> = CANDIDATES
        .iter()
        .filter(|info| gst::ElementFactory::find(info.element_name).is_some())
        .cloned()
        .collect();
    found.sort_by_key(|e| e.priority);
    found
}

/// Create and configure an encoder element
pub fn create_encoder(
    info: &EncoderInfo,
    preset: BitratePreset,
    width: u32,
    height: u32,
) -> Result<gst::Element, String> {
    let encoder = gst::ElementFactory::make(info.element_name)
        .build()
        .map_err(|e| format!("Failed to create encoder {}: {}", info.element_name, e))?;
    configure_video_encoder(&encoder, info.element_name, preset, width, height);
    Ok(encoder)
}

/// Apply bitrate and latency settings for a known encoder
fn configure_video_encoder(
    encoder: &gst::Element,
    encoder_name: &str,
    preset: BitratePreset,
    width: u32,
    height: u32,
) {
    let bitrate = preset.bitrate_kbps(width, height);

    match encoder_name {
        "x264enc" => {
            let speed = match preset {
                BitratePreset::Low => "veryfast",
                BitratePreset::Medium => "faster",
                BitratePreset::High => "medium",
            };
            encoder.set_property_from_str("speed-preset", speed);
            encoder.set_property_from_str("tune", "zerolatency");
            encoder.set_property("bitrate", bitrate);
            debug!(speed, bitrate, "Configured x264enc");
        }

        "openh264enc" => {
            encoder.set_property_from_str("rate-control", "bitrate");
            // Bits per second
            encoder.set_property("bitrate", bitrate * 1000);
            encoder.set_property_from_str("usage-type", "camera");
            debug!(bitrate_bps = bitrate * 1000, "Configured openh264enc");
        }

        "vaapih264enc" | "vah264enc" => {
            encoder.set_property_from_str("rate-control", "cbr");
            encoder.set_property("bitrate", bitrate);
            debug!(encoder = encoder_name, bitrate, "Configured VA-API encoder");
        }

        "nvh264enc" => {
            encoder.set_property("bitrate", bitrate);
            encoder.set_property_from_str("rc-mode", "vbr");
            debug!(bitrate, "Configured nvh264enc");
        }

        "qsvh264enc" => {
            encoder.set_property("bitrate", bitrate);
            debug!(bitrate, "Configured qsvh264enc");
        }

        _ => {
            debug!(encoder = encoder_name, "Using encoder defaults");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_sorted_hardware_first() {
        let mut sorted = CANDIDATES.to_vec();
        sorted.sort_by_key(|e| e.priority);
        assert_eq!(sorted, CANDIDATES.to_vec());
        assert!(sorted.first().is_some_and(|e| e.is_hardware));
        assert!(sorted.last().is_some_and(|e| !e.is_hardware));
    }

    #[test]
    fn test_container_is_mp4() {
        assert_eq!(CONTAINER_EXTENSION, "mp4");
        assert_eq!(MUXER_NAME, "mp4mux");
    }
}
