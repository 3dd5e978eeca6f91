// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame analysis results

use crate::backends::camera::types::FrameSize;

/// A face region in frame pixels
///
/// Always lies inside the frame it was detected in and has non-zero size.
/// Only meaningful for the tick that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp a raw detector box (which may poke outside the frame) to frame bounds
    ///
    /// Returns `None` when nothing of the box is left inside the frame.
    pub fn clamped(x: i32, y: i32, width: u32, height: u32, frame: FrameSize) -> Option<Self> {
        let left = i64::from(x).clamp(0, i64::from(frame.width));
        let top = i64::from(y).clamp(0, i64::from(frame.height));
        let right = (i64::from(x) + i64::from(width)).clamp(0, i64::from(frame.width));
        let bottom = (i64::from(y) + i64::from(height)).clamp(0, i64::from(frame.height));

        if right <= left || bottom <= top {
            return None;
        }

        Some(Self::new(
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    /// Centre point, rounded down
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// A rectangle of exactly `size`, centred on this one, shifted to fit in `frame`
    ///
    /// Used to keep a face stream at the size it was opened with while the
    /// detected face grows, shrinks and moves. Returns `None` if `size` does
    /// not fit in the frame at all.
    pub fn recentered(&self, size: FrameSize, frame: FrameSize) -> Option<Self> {
        if size.width == 0
            || size.height == 0
            || size.width > frame.width
            || size.height > frame.height
        {
            return None;
        }

        let (cx, cy) = self.center();
        let x = cx
            .saturating_sub(size.width / 2)
            .min(frame.width - size.width);
        let y = cy
            .saturating_sub(size.height / 2)
            .min(frame.height - size.height);

        Some(Self::new(x, y, size.width, size.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: FrameSize = FrameSize::new(640, 480);

    #[test]
    fn test_clamped_inside_is_unchanged() {
        let rect = FaceRect::clamped(10, 20, 100, 120, FRAME).unwrap();
        assert_eq!(rect, FaceRect::new(10, 20, 100, 120));
    }

    #[test]
    fn test_clamped_trims_edges() {
        let rect = FaceRect::clamped(-20, 400, 100, 120, FRAME).unwrap();
        assert_eq!(rect, FaceRect::new(0, 400, 80, 80));
    }

    #[test]
    fn test_clamped_outside_is_none() {
        assert!(FaceRect::clamped(700, 10, 50, 50, FRAME).is_none());
        assert!(FaceRect::clamped(-100, 10, 50, 50, FRAME).is_none());
    }

    #[test]
    fn test_recentered_keeps_size() {
        let face = FaceRect::new(300, 200, 40, 40);
        let rect = face.recentered(FrameSize::new(100, 120), FRAME).unwrap();
        assert_eq!(rect.size(), FrameSize::new(100, 120));
        assert_eq!(rect.center(), face.center());
    }

    #[test]
    fn test_recentered_shifts_inside_frame() {
        let corner = FaceRect::new(600, 450, 40, 30);
        let rect = corner.recentered(FrameSize::new(100, 100), FRAME).unwrap();
        assert_eq!(rect, FaceRect::new(540, 380, 100, 100));

        let origin = FaceRect::new(0, 0, 10, 10);
        let rect = origin.recentered(FrameSize::new(100, 100), FRAME).unwrap();
        assert_eq!(rect, FaceRect::new(0, 0, 100, 100));
    }

    #[test]
    fn test_recentered_too_large() {
        let face = FaceRect::new(0, 0, 10, 10);
        assert!(face.recentered(FrameSize::new(700, 100), FRAME).is_none());
    }
}
