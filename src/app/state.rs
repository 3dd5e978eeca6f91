// SPDX-License-Identifier: GPL-3.0-only

//! Session state machine
//!
//! [`SessionState::apply`] is a pure transition: it updates the flags and
//! returns the side effects the controller has to carry out. Starting a
//! recording is the one transition that depends on the outside world, so it
//! is only committed once the controller reports the main writer as open
//! (see [`SessionState::begin_recording`]).

use std::time::{Duration, Instant};

/// User commands, at most one per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    StartRecording,
    StopRecording,
    /// Start when idle, stop when recording (`r`)
    ToggleRecording,
    /// `f`
    ToggleFaceMode,
    /// `c` or space
    CaptureImage,
    /// `q`, Esc or Ctrl+C
    Quit,
}

impl Command {
    /// Map a key to a command; unknown keys are ignored
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'r' => Some(Command::ToggleRecording),
            'c' | ' ' => Some(Command::CaptureImage),
            'f' => Some(Command::ToggleFaceMode),
            'q' => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Recording state machine
///
/// Simple two-state design: either recording or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordingMode {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Recording {
        /// When recording started
        started_at: Instant,
    },
}

impl RecordingMode {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingMode::Recording { .. })
    }

    /// Elapsed recording time at `now`
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        match self {
            RecordingMode::Idle => None,
            RecordingMode::Recording { started_at } => {
                Some(now.saturating_duration_since(*started_at))
            }
        }
    }
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Open the main writer; commit with [`SessionState::begin_recording`]
    StartRecording,
    /// Finalize the main writer, then the face writer
    StopRecording,
    /// Tear down the secondary face preview surface
    HideFacePreview,
    /// Write the current raw frame (and face crop, if any) as stills
    CaptureStill,
    /// Leave the loop
    Exit,
}

/// Result of applying one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The command after toggles were resolved against the current state
    pub command: Command,
    pub effects: Vec<Effect>,
}

/// Session flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub recording: RecordingMode,
    pub face_mode: bool,
    pub face_preview_visible: bool,
    pub running: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            recording: RecordingMode::Idle,
            face_mode: false,
            face_preview_visible: false,
            running: true,
        }
    }
}

impl SessionState {
    pub fn is_recording(&self) -> bool {
        self.recording.is_recording()
    }

    /// Resolve a command against the current state and apply it
    pub fn apply(&mut self, command: Command) -> Transition {
        let command = match command {
            Command::ToggleRecording if self.is_recording() => Command::StopRecording,
            Command::ToggleRecording => Command::StartRecording,
            other => other,
        };

        let effects = match command {
            Command::StartRecording if !self.is_recording() => vec![Effect::StartRecording],
            Command::StopRecording if self.is_recording() => {
                self.end_recording();
                vec![Effect::StopRecording]
            }
            Command::StartRecording | Command::StopRecording => Vec::new(),
            Command::ToggleFaceMode => {
                self.face_mode = !self.face_mode;
                if !self.face_mode && self.face_preview_visible {
                    self.face_preview_visible = false;
                    vec![Effect::HideFacePreview]
                } else {
                    Vec::new()
                }
            }
            Command::CaptureImage => vec![Effect::CaptureStill],
            Command::Quit => {
                self.running = false;
                if self.is_recording() {
                    self.end_recording();
                    vec![Effect::StopRecording, Effect::Exit]
                } else {
                    vec![Effect::Exit]
                }
            }
            Command::ToggleRecording => Vec::new(),
        };

        Transition { command, effects }
    }

    /// Commit a start once the main writer is open
    pub fn begin_recording(&mut self, started_at: Instant) {
        self.recording = RecordingMode::Recording { started_at };
    }

    /// Back to idle (stop, quit, or a failed main writer)
    pub fn end_recording(&mut self) {
        self.recording = RecordingMode::Idle;
    }

    /// Note that the face preview surface is showing
    pub fn show_face_preview(&mut self) {
        self.face_preview_visible = true;
    }
}

/// `mm:ss`, minutes keep counting past an hour
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(Command::from_key('r'), Some(Command::ToggleRecording));
        assert_eq!(Command::from_key('R'), Some(Command::ToggleRecording));
        assert_eq!(Command::from_key(' '), Some(Command::CaptureImage));
        assert_eq!(Command::from_key('q'), Some(Command::Quit));
        assert_eq!(Command::from_key('x'), None);
    }

    #[test]
    fn test_toggle_resolves_start_then_stop() {
        let mut state = SessionState::default();
        let t = state.apply(Command::ToggleRecording);
        assert_eq!(t.command, Command::StartRecording);
        assert_eq!(t.effects, vec![Effect::StartRecording]);
        // Not committed until the writer is open
        assert!(!state.is_recording());

        state.begin_recording(Instant::now());
        let t = state.apply(Command::ToggleRecording);
        assert_eq!(t.command, Command::StopRecording);
        assert_eq!(t.effects, vec![Effect::StopRecording]);
        assert!(!state.is_recording());
    }

    #[test]
    fn test_start_while_recording_is_noop() {
        let mut state = SessionState::default();
        state.begin_recording(Instant::now());
        let before = state;
        assert!(state.apply(Command::StartRecording).effects.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let mut state = SessionState::default();
        assert!(state.apply(Command::StopRecording).effects.is_empty());
        assert!(!state.is_recording());
    }

    #[test]
    fn test_face_mode_off_hides_preview() {
        let mut state = SessionState::default();
        assert!(state.apply(Command::ToggleFaceMode).effects.is_empty());
        assert!(state.face_mode);

        state.show_face_preview();
        let t = state.apply(Command::ToggleFaceMode);
        assert_eq!(t.effects, vec![Effect::HideFacePreview]);
        assert!(!state.face_mode);
        assert!(!state.face_preview_visible);
    }

    #[test]
    fn test_face_mode_keeps_recording() {
        let mut state = SessionState::default();
        state.begin_recording(Instant::now());
        state.apply(Command::ToggleFaceMode);
        state.apply(Command::ToggleFaceMode);
        assert!(state.is_recording());
    }

    #[test]
    fn test_quit_while_recording_stops_first() {
        let mut state = SessionState::default();
        state.begin_recording(Instant::now());
        let t = state.apply(Command::Quit);
        assert_eq!(t.effects, vec![Effect::StopRecording, Effect::Exit]);
        assert!(!state.running);
        assert!(!state.is_recording());
    }

    #[test]
    fn test_capture_in_any_state() {
        let mut state = SessionState::default();
        assert_eq!(state.apply(Command::CaptureImage).effects, vec![Effect::CaptureStill]);
        state.begin_recording(Instant::now());
        assert_eq!(state.apply(Command::CaptureImage).effects, vec![Effect::CaptureStill]);
        assert!(state.is_recording());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00");
        assert_eq!(format_elapsed(Duration::from_secs(75)), "01:15");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "62:05");
    }
}
