// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands that do not need the interactive session
//!
//! This module provides command-line functionality for:
//! - Listing cameras, their formats and the usable video encoders
//! - Taking a single photo
//! - Printing or writing the effective configuration

use facecam::backends::camera::{self, FrameSource, v4l2};
use facecam::config::Config;
use facecam::constants::capture::PHOTO_WARMUP_FRAMES;
use facecam::pipelines::MediaEncoder;
use facecam::pipelines::session::OutputSession;
use facecam::pipelines::video::available_encoders;
use facecam::storage::{ArtifactKind, FsArtifactNamer};
use std::path::{Path, PathBuf};
use tracing::info;

/// List cameras, formats and encoders
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = v4l2::enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
    } else {
        println!("Available cameras:");
        println!();
        for camera in &cameras {
            println!("  {} ({})", camera.name, camera.path);
            println!("      Driver: {} on {}", camera.driver, camera.bus);

            // Group by resolution, keep the best framerate per size
            let mut resolutions: Vec<(u32, u32, u32, String)> = Vec::new();
            for format in v4l2::list_formats(&camera.path) {
                let fps = format.framerate.unwrap_or(0);
                match resolutions
                    .iter_mut()
                    .find(|(w, h, _, _)| *w == format.width && *h == format.height)
                {
                    Some(existing) if fps > existing.2 => existing.2 = fps,
                    Some(_) => {}
                    None => resolutions.push((format.width, format.height, fps, format.pixel_format)),
                }
            }
            resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

            if !resolutions.is_empty() {
                let shown: Vec<String> = resolutions
                    .iter()
                    .take(5)
                    .map(|(w, h, fps, fourcc)| format!("{}x{}@{}fps {}", w, h, fps, fourcc))
                    .collect();
                println!("      Formats: {}", shown.join(", "));
            }
            println!();
        }
    }

    let encoders = available_encoders();
    if encoders.is_empty() {
        println!("No H.264 encoder found; recording is unavailable.");
    } else {
        println!("Video encoders (in order of preference):");
        for encoder in encoders {
            let kind = if encoder.is_hardware { "hardware" } else { "software" };
            println!("  {} ({}, {})", encoder.display_name, encoder.element_name, kind);
        }
    }

    Ok(())
}

/// Capture one frame after the sensor settles and save it as an image
pub fn take_photo(config: &Config) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut source = camera::open_source(config)?;
    println!("Capture size: {}", source.frame_size());

    // Let auto exposure settle
    for _ in 0..PHOTO_WARMUP_FRAMES {
        source.next_frame()?;
    }
    let frame = source.next_frame()?;

    let encoder = MediaEncoder::new(
        config.recording.bitrate_preset,
        config.recording.jpeg_quality,
    );
    let mut output = OutputSession::new(encoder, FsArtifactNamer::new(&config.output));
    let path = output.capture_still(ArtifactKind::Image, &frame)?;

    info!(path = %path.display(), "Photo saved");
    println!("Saved: {}", path.display());
    Ok(path)
}

/// Print the effective configuration, optionally writing it to `path`
pub fn show_config(config: &Config, write_to: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if let Some(path) = write_to {
        config.save(path)?;
        println!("Written to {}", path.display());
    }
    Ok(())
}
