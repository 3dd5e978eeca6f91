// SPDX-License-Identifier: GPL-3.0-only

//! Hardware and synthetic backends

pub mod camera;
