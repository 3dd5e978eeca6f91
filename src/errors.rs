// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera session
//!
//! Each layer has its own error enum. Only [`SourceError`] is fatal for a
//! running session; output and detector errors are reported and the loop
//! keeps going.

use crate::backends::camera::types::FrameSize;
use crate::storage::ArtifactKind;
use std::path::PathBuf;
use thiserror::Error;

/// Camera / frame source errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// The device could not be opened or configured at startup
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    /// The source stopped delivering frames (device unplugged, capture thread died)
    #[error("camera stream ended")]
    Exhausted,
    /// A frame arrived but could not be decoded
    #[error("failed to decode frame: {0}")]
    Decode(String),
}

/// Face detector errors
#[derive(Debug, Error)]
pub enum FaceError {
    /// The detector model could not be loaded
    #[error("failed to load face model {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },
    /// Detection failed for this frame; callers treat it as "no face"
    #[error("face detection failed: {0}")]
    DetectorFailure(String),
}

/// Output (encoder, writer, naming) errors
#[derive(Debug, Error)]
pub enum OutputError {
    /// The destination or encoder could not be created
    #[error("encoder unavailable for {kind}: {reason}")]
    EncoderUnavailable { kind: ArtifactKind, reason: String },
    /// A frame did not match the size the writer was opened with
    #[error("{kind} writer expects {expected} frames, got {actual}")]
    DimensionMismatch {
        kind: ArtifactKind,
        expected: FrameSize,
        actual: FrameSize,
    },
    /// Writing a frame to an open writer failed
    #[error("failed to write {kind}: {reason}")]
    WriteFailed { kind: ArtifactKind, reason: String },
    /// Finalizing a writer failed; the artifact may be truncated
    #[error("failed to finalize {path}: {reason}")]
    FinalizeFailed { path: PathBuf, reason: String },
    /// A writer for this stream is already open
    #[error("{0} writer is already open")]
    AlreadyOpen(ArtifactKind),
    /// No writer is open for this stream
    #[error("no {0} writer is open")]
    NotOpen(ArtifactKind),
    /// Directory creation or other filesystem failure
    #[error("storage error for {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OutputError {
    /// Errors that only affect one frame; the writer stays usable
    pub fn is_frame_local(&self) -> bool {
        matches!(self, OutputError::DimensionMismatch { .. })
    }
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Errors that end a session run
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Display or keyboard failure (terminal I/O)
    #[error("frontend error: {0}")]
    Frontend(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = OutputError::DimensionMismatch {
            kind: ArtifactKind::FaceVideo,
            expected: FrameSize::new(120, 140),
            actual: FrameSize::new(100, 100),
        };
        assert_eq!(
            err.to_string(),
            "face video writer expects 120x140 frames, got 100x100"
        );
        assert!(err.is_frame_local());
    }

    #[test]
    fn test_encoder_unavailable_is_not_frame_local() {
        let err = OutputError::EncoderUnavailable {
            kind: ArtifactKind::Video,
            reason: "no h264 encoder".into(),
        };
        assert!(!err.is_frame_local());
    }
}
