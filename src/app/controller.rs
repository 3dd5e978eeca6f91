// SPDX-License-Identifier: GPL-3.0-only

//! Session controller
//!
//! Runs the per-tick loop:
//!
//! ```text
//! next_frame ─▶ [locate faces] ─┬─▶ overlay ─▶ present
//!                               └─▶ writers (raw frame, face crop)
//!                                        ─▶ poll command ─▶ apply
//! ```
//!
//! The raw frame and the face crop of a tick are the only pixels that reach
//! the writers; the overlay always works on a copy.

use super::frame_processor::{FaceLocator, FaceRect, largest_face};
use super::frontend::Frontend;
use super::overlay::{OverlayRenderer, OverlayView};
use super::state::{Command, Effect, SessionState};
use crate::backends::camera::FrameSource;
use crate::backends::camera::types::{Frame, FrameSize};
use crate::config::RecordingSettings;
use crate::constants::timing;
use crate::errors::{OutputError, SessionError};
use crate::pipelines::Encoder;
use crate::pipelines::session::{FinishedArtifact, OutputSession, StreamKind};
use crate::storage::{ArtifactKind, ArtifactNamer};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// External collaborators driven by the controller
pub struct Resources<S, L, E: Encoder, N: ArtifactNamer> {
    pub source: S,
    pub locator: L,
    pub output: OutputSession<E, N>,
}

/// Face crops of one tick
struct FaceCrop {
    /// The detected face region, for preview and stills
    natural: Frame,
    /// Region for the face writer: detected face re-cut at the writer's size
    rect: FaceRect,
}

pub struct SessionController<S, L, E, N, F>
where
    S: FrameSource,
    L: FaceLocator,
    E: Encoder,
    N: ArtifactNamer,
    F: Frontend,
{
    resources: Resources<S, L, E, N>,
    frontend: F,
    settings: RecordingSettings,
    state: SessionState,
    renderer: OverlayRenderer,
    frame_size: FrameSize,
    shutdown: Option<Arc<AtomicBool>>,
    notice: Option<(String, Instant)>,
    last_detector_warning: Option<Instant>,
    face_writer_failed: bool,
    finished: Vec<FinishedArtifact>,
    stills: Vec<PathBuf>,
}

impl<S, L, E, N, F> SessionController<S, L, E, N, F>
where
    S: FrameSource,
    L: FaceLocator,
    E: Encoder,
    N: ArtifactNamer,
    F: Frontend,
{
    pub fn new(resources: Resources<S, L, E, N>, frontend: F, settings: RecordingSettings) -> Self {
        let frame_size = resources.source.frame_size();
        Self {
            resources,
            frontend,
            settings,
            state: SessionState::default(),
            renderer: OverlayRenderer::new(),
            frame_size,
            shutdown: None,
            notice: None,
            last_detector_warning: None,
            face_writer_failed: false,
            finished: Vec::new(),
            stills: Vec::new(),
        }
    }

    /// Treat `flag` becoming true as a quit request (checked every tick)
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn output(&self) -> &OutputSession<E, N> {
        &self.resources.output
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Recordings finalized so far
    pub fn finished_artifacts(&self) -> &[FinishedArtifact] {
        &self.finished
    }

    /// Stills written so far
    pub fn captured_stills(&self) -> &[PathBuf] {
        &self.stills
    }

    /// Run until quit, a shutdown request, or a fatal source error
    ///
    /// Open writers are finalized on every exit path.
    pub fn run(&mut self) -> Result<(), SessionError> {
        info!(size = %self.frame_size, fps = self.settings.main_fps, "Session started");

        let result = loop {
            if self.shutdown_requested() {
                info!("Shutdown requested");
                break Ok(());
            }
            match self.tick() {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(e) => {
                    warn!(error = %e, "Session ended with error");
                    break Err(e);
                }
            }
        };

        self.shutdown();
        info!(
            recordings = self.finished.len(),
            stills = self.stills.len(),
            "Session ended"
        );
        result
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Finalize whatever is still open
    pub fn shutdown(&mut self) {
        if self.state.is_recording() {
            self.state.end_recording();
        }
        self.finish_writers();
    }

    /// One iteration of the loop; `Ok(false)` once the session should end
    pub fn tick(&mut self) -> Result<bool, SessionError> {
        let tick_start = Instant::now();
        let frame = self.resources.source.next_frame()?;

        let face = if self.state.face_mode {
            self.locate(&frame)
        } else {
            None
        };
        let crop = face.and_then(|rect| self.face_crop(&frame, rect));

        let view = OverlayView {
            recording: self.state.recording.elapsed(Instant::now()),
            face_mode: self.state.face_mode,
            face,
            notice: self.current_notice(),
        };
        let overlay = self.renderer.annotate(&frame, &view);

        if self.state.is_recording() {
            self.record(&frame, crop.as_ref());
        }

        let preview = crop.as_ref().map(|c| &c.natural);
        self.frontend.present(&overlay, preview)?;
        if preview.is_some() {
            self.state.show_face_preview();
        }

        let interval = self.settings.frame_interval();
        let timeout = interval.saturating_sub(tick_start.elapsed());
        if let Some(command) = self.frontend.poll_command(timeout)? {
            self.handle_command(command, &frame, crop.as_ref())?;
        }

        Ok(self.state.running)
    }

    /// Largest face of this frame; detector errors count as "no face"
    fn locate(&mut self, frame: &Frame) -> Option<FaceRect> {
        match self.resources.locator.locate(frame) {
            Ok(faces) => largest_face(&faces),
            Err(e) => {
                let now = Instant::now();
                let due = self
                    .last_detector_warning
                    .is_none_or(|last| now.duration_since(last) >= timing::DETECTOR_WARN_INTERVAL);
                if due {
                    warn!(error = %e, "Face detection failed");
                    self.last_detector_warning = Some(now);
                } else {
                    debug!(error = %e, "Face detection failed");
                }
                None
            }
        }
    }

    fn face_crop(&self, frame: &Frame, face: FaceRect) -> Option<FaceCrop> {
        let target = match self.resources.output.handle(StreamKind::Face) {
            Some(handle) => handle.size(),
            // Encoders want even dimensions
            None => FrameSize::new(
                (face.width & !1).max(2),
                (face.height & !1).max(2),
            ),
        };
        let rect = face.recentered(target, frame.size())?;
        Some(FaceCrop {
            natural: frame.crop(&face),
            rect,
        })
    }

    fn record(&mut self, frame: &Frame, crop: Option<&FaceCrop>) {
        if let Err(e) = self.resources.output.write(StreamKind::Main, frame) {
            if e.is_frame_local() {
                warn!(error = %e, "Dropped main frame");
            } else {
                warn!(error = %e, "Main writer failed, stopping recording");
                self.set_notice(format!("Recording stopped: {}", e));
                self.state.end_recording();
                self.finish_writers();
                return;
            }
        }

        let Some(crop) = crop.filter(|_| self.state.face_mode) else {
            return;
        };

        if !self.resources.output.is_open(StreamKind::Face) {
            if self.face_writer_failed {
                return;
            }
            let size = crop.rect.size();
            if let Err(e) = self
                .resources
                .output
                .open(StreamKind::Face, size, self.settings.face_fps)
            {
                warn!(error = %e, "Face writer unavailable");
                self.set_notice(format!("Face recording unavailable: {}", e));
                self.face_writer_failed = true;
                return;
            }
        }

        let face_frame = frame.crop(&crop.rect);
        if let Err(e) = self.resources.output.write(StreamKind::Face, &face_frame) {
            if e.is_frame_local() {
                warn!(error = %e, "Dropped face frame");
            } else {
                warn!(error = %e, "Face writer failed");
                self.face_writer_failed = true;
                self.close_stream(StreamKind::Face);
            }
        }
    }

    fn handle_command(
        &mut self,
        command: Command,
        frame: &Frame,
        crop: Option<&FaceCrop>,
    ) -> Result<(), SessionError> {
        let transition = self.state.apply(command);
        debug!(command = ?transition.command, effects = ?transition.effects, "Applied command");

        for effect in transition.effects {
            match effect {
                Effect::StartRecording => self.start_recording(),
                Effect::StopRecording => self.finish_writers(),
                Effect::HideFacePreview => self.frontend.hide_face_preview()?,
                Effect::CaptureStill => self.capture(frame, crop),
                Effect::Exit => info!("Quit requested"),
            }
        }
        Ok(())
    }

    fn start_recording(&mut self) {
        match self
            .resources
            .output
            .open(StreamKind::Main, self.frame_size, self.settings.main_fps)
        {
            Ok(handle) => {
                let path = handle.path().display().to_string();
                self.state.begin_recording(Instant::now());
                self.face_writer_failed = false;
                info!(path = %path, "Recording started");
                self.set_notice("Recording started".to_string());
            }
            Err(e) => {
                warn!(error = %e, "Could not start recording");
                self.set_notice(format!("Recording failed: {}", e));
            }
        }
    }

    fn capture(&mut self, frame: &Frame, crop: Option<&FaceCrop>) {
        let mut saved = Vec::new();
        let mut targets = vec![(ArtifactKind::Image, frame)];
        if self.state.face_mode
            && let Some(crop) = crop
        {
            targets.push((ArtifactKind::FaceImage, &crop.natural));
        }

        for (kind, source) in targets {
            match self.resources.output.capture_still(kind, source) {
                Ok(path) => {
                    saved.push(path.display().to_string());
                    self.stills.push(path);
                }
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Capture failed");
                    self.set_notice(format!("Capture failed: {}", e));
                }
            }
        }

        if !saved.is_empty() {
            self.set_notice(format!("Saved {}", saved.join(", ")));
        }
    }

    fn close_stream(&mut self, kind: StreamKind) {
        match self.resources.output.close(kind) {
            Ok(Some(artifact)) => self.finished.push(artifact),
            Ok(None) => {}
            Err(e) => self.report_finalize_error(e),
        }
    }

    /// Close main then face, recording what was saved
    fn finish_writers(&mut self) {
        for result in self.resources.output.close_all() {
            match result {
                Ok(artifact) => {
                    self.set_notice(format!("Saved {}", artifact.path.display()));
                    self.finished.push(artifact);
                }
                Err(e) => self.report_finalize_error(e),
            }
        }
    }

    fn report_finalize_error(&mut self, e: OutputError) {
        warn!(error = %e, "Finalizing writer failed");
        self.set_notice(format!("Save failed: {}", e));
    }

    fn set_notice(&mut self, message: String) {
        self.notice = Some((message, Instant::now()));
    }

    fn current_notice(&self) -> Option<String> {
        self.notice
            .as_ref()
            .filter(|(_, at)| at.elapsed() < timing::NOTICE_DURATION)
            .map(|(message, _)| message.clone())
    }
}
