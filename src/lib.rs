// SPDX-License-Identifier: GPL-3.0-only

//! facecam - a terminal camera with recording and face cropping
//!
//! Shows a live camera feed in the terminal, records it to video, captures
//! stills, and in face mode follows the largest detected face, keeping a
//! cropped face recording alongside the full one.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Session state machine, controller, overlay and face detection
//! - [`backends`]: Camera frame sources (V4L2 and a synthetic test pattern)
//! - [`pipelines`]: Still and video writers and the output session owning them
//! - [`storage`]: Output buckets and collision-free artifact names
//! - [`terminal`]: Terminal frontend
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! // Interactive session on the first camera:
//! // facecam --device /dev/video0
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{Command, SessionController, SessionState};
pub use config::Config;
pub use constants::BitratePreset;
