// SPDX-License-Identifier: GPL-3.0-only

//! Output session
//!
//! Holds at most two open recordings (the main stream and the face
//! sub-stream) and enforces their lifecycle: a stream is opened once, fed
//! frames of exactly the size it was opened with, and closed once. Stills are
//! written immediately and never stay open.

use super::{Encoder, VideoWriter};
use crate::backends::camera::types::{Frame, FrameSize};
use crate::errors::OutputError;
use crate::storage::{ArtifactKind, ArtifactNamer};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The two recordable streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Full frames
    Main,
    /// Face crops
    Face,
}

impl StreamKind {
    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            StreamKind::Main => ArtifactKind::Video,
            StreamKind::Face => ArtifactKind::FaceVideo,
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.artifact_kind())
    }
}

/// An open recording
pub struct WriterHandle<W> {
    path: PathBuf,
    size: FrameSize,
    frames: u64,
    writer: W,
}

impl<W> WriterHandle<W> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size frozen at open time
    pub fn size(&self) -> FrameSize {
        self.size
    }
}

/// A recording that was closed successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub size: FrameSize,
    pub frames: u64,
}

pub struct OutputSession<E: Encoder, N: ArtifactNamer> {
    encoder: E,
    namer: N,
    main: Option<WriterHandle<E::Writer>>,
    face: Option<WriterHandle<E::Writer>>,
}

impl<E: Encoder, N: ArtifactNamer> OutputSession<E, N> {
    pub fn new(encoder: E, namer: N) -> Self {
        Self {
            encoder,
            namer,
            main: None,
            face: None,
        }
    }

    fn slot(&self, kind: StreamKind) -> &Option<WriterHandle<E::Writer>> {
        match kind {
            StreamKind::Main => &self.main,
            StreamKind::Face => &self.face,
        }
    }

    fn slot_mut(&mut self, kind: StreamKind) -> &mut Option<WriterHandle<E::Writer>> {
        match kind {
            StreamKind::Main => &mut self.main,
            StreamKind::Face => &mut self.face,
        }
    }

    pub fn is_open(&self, kind: StreamKind) -> bool {
        self.slot(kind).is_some()
    }

    pub fn handle(&self, kind: StreamKind) -> Option<&WriterHandle<E::Writer>> {
        self.slot(kind).as_ref()
    }

    /// Open a new recording for `kind`
    ///
    /// An already open stream is never replaced; close it first.
    pub fn open(
        &mut self,
        kind: StreamKind,
        size: FrameSize,
        fps: u32,
    ) -> Result<&WriterHandle<E::Writer>, OutputError> {
        let artifact = kind.artifact_kind();
        if self.is_open(kind) {
            return Err(OutputError::AlreadyOpen(artifact));
        }

        let extension = self.encoder.video_extension().to_string();
        let path = self.namer.next_path(artifact, &Local::now(), &extension)?;
        let writer = self
            .encoder
            .open_video(&path, size, fps)
            .map_err(|reason| OutputError::EncoderUnavailable {
                kind: artifact,
                reason,
            })?;

        info!(kind = %kind, path = %path.display(), size = %size, fps, "Opened writer");
        let handle: &WriterHandle<E::Writer> = self.slot_mut(kind).insert(WriterHandle {
            path,
            size,
            frames: 0,
            writer,
        });
        Ok(handle)
    }

    /// Append one frame to an open recording
    ///
    /// A frame of the wrong size is dropped and the writer stays open.
    pub fn write(&mut self, kind: StreamKind, frame: &Frame) -> Result<(), OutputError> {
        let artifact = kind.artifact_kind();
        let handle = self
            .slot_mut(kind)
            .as_mut()
            .ok_or(OutputError::NotOpen(artifact))?;

        if frame.size() != handle.size {
            return Err(OutputError::DimensionMismatch {
                kind: artifact,
                expected: handle.size,
                actual: frame.size(),
            });
        }

        handle
            .writer
            .write(frame)
            .map_err(|reason| OutputError::WriteFailed {
                kind: artifact,
                reason,
            })?;
        handle.frames += 1;
        Ok(())
    }

    /// Finalize the recording for `kind`; `Ok(None)` if nothing was open
    pub fn close(&mut self, kind: StreamKind) -> Result<Option<FinishedArtifact>, OutputError> {
        let Some(handle) = self.slot_mut(kind).take() else {
            debug!(kind = %kind, "Close requested but no writer open");
            return Ok(None);
        };

        let WriterHandle {
            path,
            size,
            frames,
            writer,
        } = handle;

        writer
            .finish()
            .map_err(|reason| OutputError::FinalizeFailed {
                path: path.clone(),
                reason,
            })?;

        info!(kind = %kind, path = %path.display(), frames, "Closed writer");
        Ok(Some(FinishedArtifact {
            kind: kind.artifact_kind(),
            path,
            size,
            frames,
        }))
    }

    /// Close the main stream, then the face stream
    ///
    /// Returns one result per stream that was open.
    pub fn close_all(&mut self) -> Vec<Result<FinishedArtifact, OutputError>> {
        [StreamKind::Main, StreamKind::Face]
            .into_iter()
            .filter_map(|kind| match self.close(kind) {
                Ok(Some(artifact)) => Some(Ok(artifact)),
                Ok(None) => None,
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Failed to finalize writer");
                    Some(Err(e))
                }
            })
            .collect()
    }

    /// Write `frame` as a still of `kind` and return its path
    pub fn capture_still(
        &mut self,
        kind: ArtifactKind,
        frame: &Frame,
    ) -> Result<PathBuf, OutputError> {
        let extension = self.encoder.image_extension().to_string();
        let path = self.namer.next_path(kind, &frame.timestamp, &extension)?;
        self.encoder
            .write_image(&path, frame)
            .map_err(|reason| OutputError::WriteFailed { kind, reason })?;
        info!(kind = %kind, path = %path.display(), "Captured still");
        Ok(path)
    }
}

impl<E: Encoder, N: ArtifactNamer> Drop for OutputSession<E, N> {
    fn drop(&mut self) {
        if self.main.is_some() || self.face.is_some() {
            warn!("Output session dropped with open writers, finalizing");
            self.close_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use image::RgbImage;

    #[derive(Default)]
    struct CountingWriter {
        frames: u64,
    }

    impl VideoWriter for CountingWriter {
        fn write(&mut self, _frame: &Frame) -> Result<(), String> {
            self.frames += 1;
            Ok(())
        }

        fn finish(self) -> Result<(), String> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullEncoder {
        fail_open: bool,
    }

    impl Encoder for NullEncoder {
        type Writer = CountingWriter;

        fn video_extension(&self) -> &str {
            "mp4"
        }

        fn open_video(
            &mut self,
            _path: &Path,
            _size: FrameSize,
            _fps: u32,
        ) -> Result<CountingWriter, String> {
            if self.fail_open {
                Err("no encoder".into())
            } else {
                Ok(CountingWriter::default())
            }
        }

        fn write_image(&mut self, _path: &Path, _frame: &Frame) -> Result<(), String> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct SeqNamer {
        next: u32,
    }

    impl ArtifactNamer for SeqNamer {
        fn next_path(
            &mut self,
            kind: ArtifactKind,
            _timestamp: &DateTime<Local>,
            extension: &str,
        ) -> Result<PathBuf, OutputError> {
            self.next += 1;
            Ok(PathBuf::from(format!("{}_{}.{}", kind.prefix(), self.next, extension)))
        }
    }

    fn frame(width: u32, height: u32) -> Frame {
        Frame::new(RgbImage::new(width, height), 0)
    }

    #[test]
    fn test_open_twice_is_rejected() {
        let mut session = OutputSession::new(NullEncoder::default(), SeqNamer::default());
        session.open(StreamKind::Main, FrameSize::new(8, 8), 30).unwrap();
        assert!(matches!(
            session.open(StreamKind::Main, FrameSize::new(8, 8), 30),
            Err(OutputError::AlreadyOpen(ArtifactKind::Video))
        ));
    }

    #[test]
    fn test_dimension_mismatch_keeps_writer_open() {
        let mut session = OutputSession::new(NullEncoder::default(), SeqNamer::default());
        session.open(StreamKind::Face, FrameSize::new(4, 4), 3).unwrap();

        assert!(matches!(
            session.write(StreamKind::Face, &frame(5, 4)),
            Err(OutputError::DimensionMismatch { .. })
        ));
        session.write(StreamKind::Face, &frame(4, 4)).unwrap();

        let finished = session.close(StreamKind::Face).unwrap().unwrap();
        assert_eq!(finished.frames, 1);
        assert_eq!(finished.kind, ArtifactKind::FaceVideo);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut session = OutputSession::new(NullEncoder::default(), SeqNamer::default());
        session.open(StreamKind::Main, FrameSize::new(8, 8), 30).unwrap();
        assert!(session.close(StreamKind::Main).unwrap().is_some());
        assert!(session.close(StreamKind::Main).unwrap().is_none());
    }

    #[test]
    fn test_write_without_open() {
        let mut session = OutputSession::new(NullEncoder::default(), SeqNamer::default());
        assert!(matches!(
            session.write(StreamKind::Main, &frame(8, 8)),
            Err(OutputError::NotOpen(ArtifactKind::Video))
        ));
    }

    #[test]
    fn test_failed_open_leaves_slot_empty() {
        let encoder = NullEncoder { fail_open: true };
        let mut session = OutputSession::new(encoder, SeqNamer::default());
        assert!(matches!(
            session.open(StreamKind::Main, FrameSize::new(8, 8), 30),
            Err(OutputError::EncoderUnavailable { .. })
        ));
        assert!(!session.is_open(StreamKind::Main));
    }

    #[test]
    fn test_close_all_order() {
        let mut session = OutputSession::new(NullEncoder::default(), SeqNamer::default());
        session.open(StreamKind::Face, FrameSize::new(4, 4), 3).unwrap();
        session.open(StreamKind::Main, FrameSize::new(8, 8), 30).unwrap();

        let kinds: Vec<ArtifactKind> = session
            .close_all()
            .into_iter()
            .map(|r| r.unwrap().kind)
            .collect();
        assert_eq!(kinds, vec![ArtifactKind::Video, ArtifactKind::FaceVideo]);
    }
}
