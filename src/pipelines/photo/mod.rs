// SPDX-License-Identifier: GPL-3.0-only

//! Photo pipeline

pub mod encoding;

pub use encoding::{IMAGE_EXTENSION, PhotoEncoder};
