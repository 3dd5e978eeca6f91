// SPDX-License-Identifier: GPL-3.0-only

//! Display overlay
//!
//! Builds the annotated copy of a frame that is shown to the user. Shapes
//! (recording dot, face box) are drawn into the copied pixels; text is carried
//! as positioned labels for the frontend to draw on top. Nothing here ever
//! touches the frame that goes to the writers.

use super::frame_processor::FaceRect;
use super::state::format_elapsed;
use crate::backends::camera::types::Frame;
use crate::constants::overlay as layout;
use image::{Rgb, RgbImage};
use std::time::Duration;

/// What the overlay should show this tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayView {
    /// Elapsed time when recording
    pub recording: Option<Duration>,
    pub face_mode: bool,
    /// Largest face of this tick
    pub face: Option<FaceRect>,
    /// Most recent status message
    pub notice: Option<String>,
}

/// A text label anchored at a pixel position of the frame (top-left of the text)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLabel {
    pub x: u32,
    pub y: u32,
    pub text: String,
    pub color: [u8; 3],
}

/// Annotated display buffer
#[derive(Debug, Clone)]
pub struct Overlay {
    pub image: RgbImage,
    pub labels: Vec<OverlayLabel>,
}

impl Overlay {
    /// Label text in draw order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.text.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer;

impl OverlayRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Produce the display copy of `frame`
    pub fn annotate(&self, frame: &Frame, view: &OverlayView) -> Overlay {
        let mut image = frame.image.clone();
        let mut labels = Vec::new();
        let height = image.height();

        if let Some(face) = view.face {
            draw_rect(
                &mut image,
                &face,
                Rgb(layout::FACE_BOX_COLOR),
                layout::FACE_BOX_THICKNESS,
            );
        }

        if let Some(elapsed) = view.recording {
            let (cx, cy) = layout::RECORDING_DOT_CENTER;
            fill_circle(
                &mut image,
                cx,
                cy,
                layout::RECORDING_DOT_RADIUS,
                Rgb(layout::RECORDING_COLOR),
            );
            let (x, y) = layout::REC_LABEL_POSITION;
            labels.push(OverlayLabel {
                x,
                y,
                text: format!("REC {}", format_elapsed(elapsed)),
                color: layout::RECORDING_COLOR,
            });
        }

        let (x, y) = layout::FACE_MODE_LABEL_POSITION;
        labels.push(OverlayLabel {
            x,
            y,
            text: format!("Face Mode: {}", if view.face_mode { "ON" } else { "OFF" }),
            color: layout::TEXT_COLOR,
        });

        if let Some(notice) = &view.notice {
            let (x, y) = layout::NOTICE_LABEL_POSITION;
            labels.push(OverlayLabel {
                x,
                y,
                text: notice.clone(),
                color: layout::TEXT_COLOR,
            });
        }

        for (i, line) in layout::HELP_LINES.iter().enumerate() {
            let offset = layout::HELP_BOTTOM_MARGIN + i as u32 * layout::HELP_LINE_SPACING;
            labels.push(OverlayLabel {
                x: 10,
                y: height.saturating_sub(offset),
                text: (*line).to_string(),
                color: layout::TEXT_COLOR,
            });
        }

        Overlay { image, labels }
    }
}

/// Outline `rect` with the given thickness, clipped to the image
pub fn draw_rect(image: &mut RgbImage, rect: &FaceRect, color: Rgb<u8>, thickness: u32) {
    let (width, height) = image.dimensions();
    let x0 = rect.x.min(width);
    let y0 = rect.y.min(height);
    let x1 = rect.x.saturating_add(rect.width).min(width);
    let y1 = rect.y.saturating_add(rect.height).min(height);
    let t = thickness.max(1);

    for y in y0..y1 {
        for x in x0..x1 {
            let on_edge = x < x0 + t || x + t >= x1 || y < y0 + t || y + t >= y1;
            if on_edge {
                image.put_pixel(x, y, color);
            }
        }
    }
}

/// Fill a disc, clipped to the image
pub fn fill_circle(image: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame() -> Frame {
        Frame::new(RgbImage::from_pixel(200, 150, Rgb([50, 50, 50])), 0)
    }

    #[test]
    fn test_annotate_leaves_input_untouched() {
        let frame = gray_frame();
        let before = frame.image.clone();
        let view = OverlayView {
            recording: Some(Duration::from_secs(3)),
            face_mode: true,
            face: Some(FaceRect::new(50, 40, 60, 60)),
            notice: Some("Saved".into()),
        };

        let overlay = OverlayRenderer::new().annotate(&frame, &view);
        assert_eq!(frame.image, before);
        assert_ne!(overlay.image, before);
    }

    #[test]
    fn test_recording_dot_and_label() {
        let view = OverlayView {
            recording: Some(Duration::from_secs(65)),
            ..Default::default()
        };
        let overlay = OverlayRenderer::new().annotate(&gray_frame(), &view);
        assert_eq!(overlay.image.get_pixel(30, 30).0, layout::RECORDING_COLOR);
        assert!(overlay.texts().any(|t| t == "REC 01:05"));
    }

    #[test]
    fn test_idle_has_no_rec_label() {
        let overlay = OverlayRenderer::new().annotate(&gray_frame(), &OverlayView::default());
        assert!(!overlay.texts().any(|t| t.starts_with("REC")));
        assert!(overlay.texts().any(|t| t == "Face Mode: OFF"));
        assert_eq!(overlay.image.get_pixel(30, 30).0, [50, 50, 50]);
        // four help lines plus the face mode flag
        assert_eq!(overlay.labels.len(), 5);
    }

    #[test]
    fn test_face_box_outline_only() {
        let view = OverlayView {
            face: Some(FaceRect::new(50, 40, 60, 60)),
            face_mode: true,
            ..Default::default()
        };
        let overlay = OverlayRenderer::new().annotate(&gray_frame(), &view);
        assert_eq!(overlay.image.get_pixel(50, 40).0, layout::FACE_BOX_COLOR);
        assert_eq!(overlay.image.get_pixel(109, 99).0, layout::FACE_BOX_COLOR);
        assert_eq!(overlay.image.get_pixel(80, 70).0, [50, 50, 50]);
    }
}
