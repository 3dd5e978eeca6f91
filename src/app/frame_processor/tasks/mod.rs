// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame analysis tasks

pub mod face_detector;
