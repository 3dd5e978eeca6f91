// SPDX-License-Identifier: GPL-3.0-only

//! Display and keyboard seam

use super::overlay::Overlay;
use super::state::Command;
use crate::backends::camera::types::Frame;
use std::io;
use std::time::Duration;

/// Where frames are shown and commands come from
///
/// Display and input share one trait because in the terminal they share one
/// device; tests script both through a single fake.
pub trait Frontend {
    /// Show the annotated main view and, when given, the face crop on the
    /// secondary surface
    fn present(&mut self, overlay: &Overlay, face: Option<&Frame>) -> io::Result<()>;

    /// Tear down the secondary face surface
    fn hide_face_preview(&mut self) -> io::Result<()>;

    /// Wait up to `timeout` for one command; unrecognized input yields `None`
    fn poll_command(&mut self, timeout: Duration) -> io::Result<Option<Command>>;
}
