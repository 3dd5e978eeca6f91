// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer video writer
//!
//! Frames are pushed into an `appsrc`:
//!
//! ```text
//! appsrc (RGB) ! videoconvert ! <h264 encoder> ! h264parse ! mp4mux ! filesink
//! ```
//!
//! Timestamps come from the frame counter and the declared rate, so a file
//! always plays back at the rate it was opened with regardless of how fast
//! frames arrived.

use super::encoder_selection::{self, EncoderInfo, MUXER_NAME, PARSER_NAME};
use crate::backends::camera::types::{Frame, FrameSize};
use crate::constants::{BitratePreset, timing};
use crate::pipelines::VideoWriter;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app::AppSrc;
use gstreamer_video::{VideoFormat, VideoInfo};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// One open recording
pub struct GstVideoWriter {
    pipeline: gst::Pipeline,
    appsrc: AppSrc,
    video_info: VideoInfo,
    file_path: PathBuf,
    fps: u32,
    frames: u64,
    encoder_name: &'static str,
}

impl GstVideoWriter {
    /// Build and start a recording pipeline with the first encoder that works
    pub fn create(
        path: &Path,
        size: FrameSize,
        fps: u32,
        preset: BitratePreset,
    ) -> Result<Self, String> {
        gst::init().map_err(|e| format!("Failed to initialize GStreamer: {}", e))?;

        let encoders = encoder_selection::available_encoders();
        if encoders.is_empty() {
            return Err("No H.264 encoder available. Please install gstreamer1-plugins-ugly (x264enc) or gstreamer1-plugin-openh264".to_string());
        }

        let mut last_error = String::new();
        for info in &encoders {
            match Self::create_with(path, size, fps, preset, info) {
                Ok(writer) => return Ok(writer),
                Err(e) => {
                    warn!(encoder = info.element_name, error = %e, "Encoder failed, trying next");
                    // filesink may already have created an empty file
                    let _ = std::fs::remove_file(path);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    fn create_with(
        path: &Path,
        size: FrameSize,
        fps: u32,
        preset: BitratePreset,
        info: &EncoderInfo,
    ) -> Result<Self, String> {
        let video_info = VideoInfo::builder(VideoFormat::Rgb, size.width, size.height)
            .fps(gst::Fraction::new(fps.max(1) as i32, 1))
            .build()
            .map_err(|e| format!("Invalid video format {}: {}", size, e))?;
        let caps = video_info
            .to_caps()
            .map_err(|e| format!("Failed to build caps: {}", e))?;

        let pipeline = gst::Pipeline::new();

        let appsrc = gst::ElementFactory::make("appsrc")
            .name("facecam_src")
            .build()
            .map_err(|e| format!("Failed to create appsrc: {}", e))?
            .downcast::<AppSrc>()
            .map_err(|_| "Failed to downcast to AppSrc".to_string())?;
        appsrc.set_caps(Some(&caps));
        appsrc.set_format(gst::Format::Time);
        appsrc.set_is_live(false);

        let videoconvert = gst::ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| format!("Failed to create videoconvert: {}", e))?;
        let encoder = encoder_selection::create_encoder(info, preset, size.width, size.height)?;
        let parser = gst::ElementFactory::make(PARSER_NAME)
            .build()
            .map_err(|e| format!("Failed to create {}: {}", PARSER_NAME, e))?;
        let muxer = gst::ElementFactory::make(MUXER_NAME)
            .build()
            .map_err(|e| format!("Failed to create {}: {}", MUXER_NAME, e))?;
        let filesink = gst::ElementFactory::make("filesink")
            .property("location", path.to_string_lossy().to_string())
            .build()
            .map_err(|e| format!("Failed to create filesink: {}", e))?;

        let elements = [
            appsrc.upcast_ref(),
            &videoconvert,
            &encoder,
            &parser,
            &muxer,
            &filesink,
        ];
        pipeline
            .add_many(elements)
            .map_err(|e| format!("Failed to add elements: {}", e))?;
        gst::Element::link_many(elements)
            .map_err(|e| format!("Failed to link recording pipeline: {}", e))?;

        let writer = Self {
            pipeline,
            appsrc,
            video_info,
            file_path: path.to_path_buf(),
            fps: fps.max(1),
            frames: 0,
            encoder_name: info.element_name,
        };
        writer.start()?;

        info!(
            path = %path.display(),
            size = %size,
            fps,
            encoder = info.element_name,
            "Recording pipeline started"
        );
        Ok(writer)
    }

    fn start(&self) -> Result<(), String> {
        self.pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| format!("Failed to start recording: {}", e))?;

        let timeout = gst::ClockTime::from_nseconds(timing::START_TIMEOUT.as_nanos() as u64);
        let (result, _state, _pending) = self.pipeline.state(timeout);
        if result.is_err() {
            let _ = self.pipeline.set_state(gst::State::Null);
            return Err(format!(
                "{} pipeline failed to reach Playing state",
                self.encoder_name
            ));
        }

        // Check for immediate errors
        if let Some(bus) = self.pipeline.bus()
            && let Some(msg) = bus.timed_pop_filtered(
                gst::ClockTime::from_mseconds(100),
                &[gst::MessageType::Error],
            )
            && let gst::MessageView::Error(err) = msg.view()
        {
            error!(
                error = %err.error(),
                debug = ?err.debug(),
                source = ?err.src().map(|s| s.name()),
                "GStreamer error during start"
            );
            let _ = self.pipeline.set_state(gst::State::Null);
            return Err(format!("Recording start error: {}", err.error()));
        }

        Ok(())
    }

    /// Copy packed RGB rows into a buffer laid out with GStreamer's stride
    fn frame_buffer(&self, frame: &Frame) -> Result<gst::Buffer, String> {
        let width = self.video_info.width() as usize;
        let height = self.video_info.height() as usize;
        let stride = self.video_info.stride()[0] as usize;
        let row_bytes = width * 3;
        let src = frame.image.as_raw();

        let mut buffer = gst::Buffer::with_size(self.video_info.size())
            .map_err(|e| format!("Failed to allocate buffer: {}", e))?;
        {
            let buffer_ref = buffer
                .get_mut()
                .ok_or_else(|| "Failed to get mutable buffer reference".to_string())?;

            let fps = u64::from(self.fps);
            let pts = gst::ClockTime::from_nseconds(self.frames * 1_000_000_000 / fps);
            let duration = gst::ClockTime::from_nseconds(1_000_000_000 / fps);
            buffer_ref.set_pts(pts);
            buffer_ref.set_duration(duration);

            let mut map = buffer_ref
                .map_writable()
                .map_err(|e| format!("Failed to map buffer: {}", e))?;
            if stride == row_bytes {
                map[..row_bytes * height].copy_from_slice(&src[..row_bytes * height]);
            } else {
                for (row, line) in src.chunks_exact(row_bytes).take(height).enumerate() {
                    map[row * stride..row * stride + row_bytes].copy_from_slice(line);
                }
            }
        }
        Ok(buffer)
    }
}

impl VideoWriter for GstVideoWriter {
    fn write(&mut self, frame: &Frame) -> Result<(), String> {
        if frame.width() != self.video_info.width() || frame.height() != self.video_info.height()
        {
            return Err(format!(
                "frame is {}, pipeline expects {}x{}",
                frame.size(),
                self.video_info.width(),
                self.video_info.height()
            ));
        }

        let buffer = self.frame_buffer(frame)?;
        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| format!("Failed to push frame: {:?}", e))?;

        self.frames += 1;
        if self.frames % timing::FRAME_LOG_INTERVAL == 0 {
            debug!(frames = self.frames, path = %self.file_path.display(), "Recording progress");
        }
        Ok(())
    }

    /// Send EOS, wait for the muxer to write its trailer, then shut down
    fn finish(self) -> Result<(), String> {
        info!(path = %self.file_path.display(), frames = self.frames, "Finalizing recording");

        if let Err(e) = self.appsrc.end_of_stream() {
            warn!(error = ?e, "Failed to send EOS to appsrc");
        }

        let mut result = Ok(());
        if let Some(bus) = self.pipeline.bus() {
            let timeout = gst::ClockTime::from_nseconds(timing::EOS_TIMEOUT.as_nanos() as u64);
            match bus.timed_pop_filtered(
                timeout,
                &[gst::MessageType::Eos, gst::MessageType::Error],
            ) {
                Some(msg) => {
                    if let gst::MessageView::Error(err) = msg.view() {
                        result = Err(format!("GStreamer error while finalizing: {}", err.error()));
                    }
                }
                None => {
                    result = Err("timed out waiting for end of stream".to_string());
                }
            }
        }

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| format!("Failed to stop pipeline: {}", e))?;

        if result.is_ok() {
            info!(path = %self.file_path.display(), "Recording saved");
        }
        result
    }
}

impl Drop for GstVideoWriter {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}
