// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic frame source
//!
//! Produces moving color bars with a bright disc drifting across them, paced
//! to the configured rate. Useful without a camera and for exercising the
//! recording path end to end.

use super::FrameSource;
use super::types::{Frame, FrameSize};
use crate::errors::SourceError;
use image::{Rgb, RgbImage};
use std::time::{Duration, Instant};
use tracing::debug;

const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

pub struct TestPatternSource {
    size: FrameSize,
    interval: Duration,
    next_due: Option<Instant>,
    sequence: u64,
    limit: Option<u64>,
}

impl TestPatternSource {
    pub fn new(size: FrameSize, fps: u32) -> Self {
        debug!(size = %size, fps, "Creating test pattern source");
        Self {
            size,
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            next_due: None,
            sequence: 0,
            limit: None,
        }
    }

    /// Stop with [`SourceError::Exhausted`] after `frames` frames
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    /// Do not sleep between frames
    pub fn unpaced(mut self) -> Self {
        self.interval = Duration::ZERO;
        self
    }

    fn render(&self) -> RgbImage {
        let FrameSize { width, height } = self.size;
        let shift = (self.sequence * 4) as u32;
        let bar_width = (width / BARS.len() as u32).max(1);

        // Disc drifts left to right, one pass every 256 frames
        let radius = (height / 6).max(1) as i64;
        let cx = ((self.sequence % 256) as i64 * width as i64) / 256;
        let cy = height as i64 / 2;

        RgbImage::from_fn(width, height, |x, y| {
            let dx = x as i64 - cx;
            let dy = y as i64 - cy;
            if dx * dx + dy * dy <= radius * radius {
                return Rgb([240, 220, 200]);
            }
            let bar = ((x + shift) / bar_width) as usize % BARS.len();
            Rgb(BARS[bar])
        })
    }
}

impl FrameSource for TestPatternSource {
    fn frame_size(&self) -> FrameSize {
        self.size
    }

    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        if self.limit.is_some_and(|limit| self.sequence >= limit) {
            return Err(SourceError::Exhausted);
        }

        if let Some(due) = self.next_due {
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        self.next_due = Some(Instant::now() + self.interval);

        let frame = Frame::new(self.render(), self.sequence);
        self.sequence += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_have_fixed_size() {
        let mut source = TestPatternSource::new(FrameSize::new(64, 48), 30).unpaced();
        for expected in 0..3 {
            let frame = source.next_frame().unwrap();
            assert_eq!(frame.size(), FrameSize::new(64, 48));
            assert_eq!(frame.sequence, expected);
        }
    }

    #[test]
    fn test_limit_exhausts() {
        let mut source = TestPatternSource::new(FrameSize::new(8, 8), 30)
            .unpaced()
            .with_limit(2);
        assert!(source.next_frame().is_ok());
        assert!(source.next_frame().is_ok());
        assert!(matches!(source.next_frame(), Err(SourceError::Exhausted)));
    }

    #[test]
    fn test_pattern_moves() {
        let mut source = TestPatternSource::new(FrameSize::new(70, 10), 30).unpaced();
        let a = source.next_frame().unwrap();
        let b = source.next_frame().unwrap();
        assert_ne!(a.image.as_raw(), b.image.as_raw());
    }
}
