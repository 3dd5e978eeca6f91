// SPDX-License-Identifier: GPL-3.0-only

//! Interactive camera session
//!
//! # Architecture
//!
//! - `state`: Commands, recording mode and the pure transition function
//! - `controller`: The per-tick loop tying source, detector, writers and frontend together
//! - `overlay`: Display-only annotation of frames
//! - `frame_processor`: Face location
//! - `frontend`: Display and keyboard seam (implemented by the terminal UI)
//!
//! # Main Types
//!
//! - `SessionController`: Owns the loop and all collaborators
//! - `SessionState`: Recording and face mode flags
//! - `Command`: Everything the user can ask for

pub mod controller;
pub mod frame_processor;
pub mod frontend;
pub mod overlay;
pub mod state;

pub use controller::{Resources, SessionController};
pub use frontend::Frontend;
pub use overlay::{Overlay, OverlayLabel, OverlayRenderer, OverlayView};
pub use state::{Command, Effect, RecordingMode, SessionState, Transition};
