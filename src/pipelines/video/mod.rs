// SPDX-License-Identifier: GPL-3.0-only

//! Video recording pipeline
//!
//! - Picks the best available H.264 encoder (hardware preferred)
//! - Muxes into MP4
//! - Bitrate follows the configured preset and the stream resolution

pub mod encoder_selection;
pub mod recorder;

pub use encoder_selection::{CONTAINER_EXTENSION, EncoderInfo, available_encoders};
pub use recorder::GstVideoWriter;
