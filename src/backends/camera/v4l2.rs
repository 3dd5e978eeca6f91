// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 frame source
//!
//! The device is opened and its format negotiated on the caller's thread so
//! that the session knows its frame size before the first frame. Buffers are
//! then dequeued on a dedicated capture thread, decoded to RGB, rotated and
//! handed over a small bounded channel. `open` waits until that thread has
//! started streaming, so a device that cannot stream fails there. When the
//! channel is full the newest frame is dropped, which keeps latency bounded
//! when the session falls behind.

use super::FrameSource;
use super::format_converters::decode_buffer;
use super::frame_loop::{CaptureLoopController, LoopAction};
use super::types::{CameraDevice, CameraFormat, Frame, FrameSize, PixelFormat, SensorRotation};
use crate::config::CameraSettings;
use crate::constants::{capture, timing};
use crate::errors::SourceError;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use tracing::{debug, info, trace, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::video::capture::Parameters;
use v4l::{Format, FourCC};

/// Negotiated capture format
#[derive(Debug, Clone, Copy)]
struct Negotiated {
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
    stride: u32,
}

/// Live camera via V4L2 mmap streaming
pub struct V4l2Source {
    receiver: Receiver<Frame>,
    frame_size: FrameSize,
    // Stops and joins the capture thread on drop
    _capture: CaptureLoopController,
}

impl V4l2Source {
    /// Open the configured device and start capturing
    pub fn open(settings: &CameraSettings, fps: u32) -> Result<Self, SourceError> {
        let device_path = settings.device.as_str();
        info!(device = device_path, "Opening V4L2 device");

        let dev = Device::with_path(device_path).map_err(|e| {
            SourceError::Unavailable(format!("failed to open {}: {}", device_path, e))
        })?;

        let negotiated = negotiate_format(&dev, settings)?;
        if negotiated.width != settings.width || negotiated.height != settings.height {
            warn!(
                requested = %settings.requested_size(),
                actual = %FrameSize::new(negotiated.width, negotiated.height),
                "Device adjusted the capture size"
            );
        }

        match dev.set_params(&Parameters::with_fps(fps)) {
            Ok(params) => debug!(interval = ?params.interval, "Set frame interval"),
            Err(e) => debug!(error = %e, "Device rejected frame rate, using its default"),
        }

        let rotation = settings.rotation();
        let frame_size = FrameSize::new(negotiated.width, negotiated.height).rotated(rotation);
        let (sender, receiver) = mpsc::sync_channel(capture::FRAME_QUEUE_DEPTH);

        let thread_name = format!("v4l2-capture-{}", device_name(device_path));
        let capture = CaptureLoopController::start_with_init(
            &thread_name,
            move || {
                let stream =
                    MmapStream::with_buffers(&dev, Type::VideoCapture, capture::V4L2_BUFFER_COUNT)
                        .map_err(|e| format!("Failed to create buffer stream: {}", e))?;
                info!("V4L2 capture stream started");
                Ok(CaptureState {
                    stream,
                    _device: dev,
                    sender,
                    negotiated,
                    rotation,
                    sequence: 0,
                    failures: 0,
                })
            },
            capture_step,
        )
        .map_err(SourceError::Unavailable)?;

        info!(
            format = ?negotiated.pixel_format,
            size = %frame_size,
            rotation = %rotation,
            "V4L2 source ready"
        );

        Ok(Self {
            receiver,
            frame_size,
            _capture: capture,
        })
    }
}

impl FrameSource for V4l2Source {
    fn frame_size(&self) -> FrameSize {
        self.frame_size
    }

    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        // The sender lives on the capture thread; a closed channel means it is gone
        self.receiver.recv().map_err(|_| SourceError::Exhausted)
    }
}

/// Per-thread capture state
struct CaptureState {
    stream: MmapStream<'static>,
    _device: Device,
    sender: SyncSender<Frame>,
    negotiated: Negotiated,
    rotation: SensorRotation,
    sequence: u64,
    failures: u32,
}

fn capture_step(state: &mut CaptureState) -> LoopAction {
    let (buf, meta) = match state.stream.next() {
        Ok(next) => next,
        Err(e) => {
            state.failures += 1;
            warn!(error = %e, failures = state.failures, "Failed to dequeue frame");
            if state.failures >= capture::MAX_CONSECUTIVE_FAILURES {
                warn!("Too many consecutive capture failures, stopping");
                return LoopAction::Stop;
            }
            std::thread::sleep(timing::CAPTURE_RETRY_DELAY);
            return LoopAction::Continue;
        }
    };
    state.failures = 0;

    let used = (meta.bytesused as usize).min(buf.len());
    let data = if used > 0 { &buf[..used] } else { buf };
    let n = state.negotiated;

    let image = match decode_buffer(data, n.pixel_format, n.width, n.height, n.stride) {
        Ok(image) => image,
        Err(e) => {
            debug!(error = %e, sequence = meta.sequence, "Dropping undecodable frame");
            return LoopAction::Continue;
        }
    };

    let frame = Frame::new(state.rotation.apply(image), state.sequence);
    state.sequence += 1;

    match state.sender.try_send(frame) {
        Ok(()) => {
            if state.sequence % timing::FRAME_LOG_INTERVAL == 0 {
                debug!(frames = state.sequence, "Capture progress");
            }
            LoopAction::Continue
        }
        Err(TrySendError::Full(_)) => {
            trace!(sequence = state.sequence, "Frame dropped (channel full)");
            LoopAction::Continue
        }
        Err(TrySendError::Disconnected(_)) => LoopAction::Stop,
    }
}

/// Try the preferred pixel format first, then the others
fn negotiate_format(dev: &Device, settings: &CameraSettings) -> Result<Negotiated, SourceError> {
    let mut candidates: Vec<PixelFormat> = settings.pixel_format.into_iter().collect();
    candidates.extend(
        PixelFormat::ALL
            .into_iter()
            .filter(|f| Some(*f) != settings.pixel_format),
    );

    for pixel_format in candidates {
        let request = Format::new(
            settings.width,
            settings.height,
            FourCC::new(pixel_format.fourcc()),
        );
        match dev.set_format(&request) {
            Ok(actual) if PixelFormat::from_fourcc(&actual.fourcc.repr) == Some(pixel_format) => {
                info!(
                    width = actual.width,
                    height = actual.height,
                    fourcc = %actual.fourcc,
                    "Set V4L2 format"
                );
                return Ok(Negotiated {
                    pixel_format,
                    width: actual.width,
                    height: actual.height,
                    stride: actual.stride,
                });
            }
            Ok(actual) => {
                debug!(requested = ?pixel_format, got = %actual.fourcc, "Format not accepted");
            }
            Err(e) => {
                debug!(requested = ?pixel_format, error = %e, "Failed to set format");
            }
        }
    }

    Err(SourceError::Unavailable(format!(
        "{} supports none of MJPG, YUYV, RGB3",
        settings.device
    )))
}

fn device_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Scan `/dev/video*` for capture devices
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    let mut paths: Vec<_> = std::fs::read_dir("/dev")
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("video"))
        })
        .collect();
    paths.sort();

    let mut cameras = Vec::new();
    for path in paths {
        let Ok(dev) = Device::with_path(&path) else {
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            continue;
        };
        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            trace!(path = %path.display(), "Skipping non-capture node");
            continue;
        }
        // Metadata nodes advertise capture but list no formats
        if dev.enum_formats().map(|f| f.is_empty()).unwrap_or(true) {
            continue;
        }

        let device = CameraDevice {
            name: caps.card.clone(),
            path: path.to_string_lossy().to_string(),
            driver: caps.driver.clone(),
            bus: caps.bus.clone(),
        };
        debug!(name = %device.name, path = %device.path, "Found camera");
        cameras.push(device);
    }
    cameras
}

/// List (format, size, rate) combinations the device offers
pub fn list_formats(device_path: &str) -> Vec<CameraFormat> {
    let Ok(dev) = Device::with_path(device_path) else {
        return Vec::new();
    };

    let mut formats = Vec::new();
    for fmt_desc in dev.enum_formats().into_iter().flatten() {
        let pixel_format = fmt_desc.fourcc.to_string();
        for size in dev.enum_framesizes(fmt_desc.fourcc).into_iter().flatten() {
            match size.size {
                v4l::framesize::FrameSizeEnum::Discrete(discrete) => {
                    let intervals = dev
                        .enum_frameintervals(fmt_desc.fourcc, discrete.width, discrete.height)
                        .unwrap_or_default();
                    if intervals.is_empty() {
                        formats.push(CameraFormat {
                            width: discrete.width,
                            height: discrete.height,
                            framerate: None,
                            pixel_format: pixel_format.clone(),
                        });
                    }
                    for interval in intervals {
                        let framerate = match interval.interval {
                            v4l::frameinterval::FrameIntervalEnum::Discrete(frac)
                                if frac.numerator > 0 =>
                            {
                                Some(frac.denominator / frac.numerator)
                            }
                            _ => None,
                        };
                        formats.push(CameraFormat {
                            width: discrete.width,
                            height: discrete.height,
                            framerate,
                            pixel_format: pixel_format.clone(),
                        });
                    }
                }
                v4l::framesize::FrameSizeEnum::Stepwise(step) => {
                    // Add common resolutions
                    for (w, h) in [(1920, 1080), (1280, 720), (640, 480)] {
                        if (step.min_width..=step.max_width).contains(&w)
                            && (step.min_height..=step.max_height).contains(&h)
                        {
                            formats.push(CameraFormat {
                                width: w,
                                height: h,
                                framerate: None,
                                pixel_format: pixel_format.clone(),
                            });
                        }
                    }
                }
            }
        }
    }
    formats
}
