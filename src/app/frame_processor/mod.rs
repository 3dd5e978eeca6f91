// SPDX-License-Identifier: GPL-3.0-only

//! Frame analysis
//!
//! Face location for face mode. Detection runs synchronously on the session
//! thread, once per tick, on the raw (un-annotated) frame.

pub mod tasks;
pub mod types;

pub use tasks::face_detector::{
    DisabledLocator, FaceLocator, SeetaFaceLocator, create_locator, largest_face,
};
pub use types::FaceRect;
