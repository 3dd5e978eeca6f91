// SPDX-License-Identifier: GPL-3.0-only

//! Camera frame sources
//!
//! ```text
//! ┌─────────────────────┐
//! │  SessionController  │
//! └──────────┬──────────┘
//!            │ next_frame()
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource Trait  │  ← one RGB frame per call, fixed size
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌─────────┐
//!   │ V4L2 │  │ Pattern │
//!   └──────┘  └─────────┘
//! ```

pub mod format_converters;
pub mod frame_loop;
pub mod test_pattern;
pub mod types;
pub mod v4l2;

pub use test_pattern::TestPatternSource;
pub use types::*;
pub use v4l2::V4l2Source;

use crate::config::{Config, SourceKind};
use crate::errors::SourceError;

/// A live stream of frames
///
/// Every frame has the same [`FrameSize`] and is already rotated to the
/// session's orientation. `next_frame` blocks until a frame is available.
pub trait FrameSource {
    fn frame_size(&self) -> FrameSize;

    /// Next frame; [`SourceError::Exhausted`] once the stream has ended
    fn next_frame(&mut self) -> Result<Frame, SourceError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn frame_size(&self) -> FrameSize {
        (**self).frame_size()
    }

    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        (**self).next_frame()
    }
}

/// Open the source selected in `config`
pub fn open_source(config: &Config) -> Result<Box<dyn FrameSource>, SourceError> {
    let fps = config.recording.main_fps;
    match config.camera.source {
        SourceKind::V4l2 => Ok(Box::new(V4l2Source::open(&config.camera, fps)?)),
        SourceKind::Pattern => {
            let size = config
                .camera
                .requested_size()
                .rotated(config.camera.rotation());
            Ok(Box::new(TestPatternSource::new(size, fps)))
        }
    }
}
