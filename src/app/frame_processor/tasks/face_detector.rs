// SPDX-License-Identifier: GPL-3.0-only

//! Face detection task
//!
//! Implements face location using the SeetaFace cascade from `rustface`.
//! Frames are converted to grayscale and scanned at several pyramid levels;
//! every hit is clamped to the frame before it is returned.

use crate::app::frame_processor::types::FaceRect;
use crate::backends::camera::types::Frame;
use crate::config::FaceSettings;
use crate::errors::FaceError;
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// Finds faces in a single frame
///
/// Implementations are stateless across frames: the result depends only on
/// the frame passed in.
pub trait FaceLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceRect>, FaceError>;
}

impl<T: FaceLocator + ?Sized> FaceLocator for Box<T> {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceRect>, FaceError> {
        (**self).locate(frame)
    }
}

/// Pick the face with the largest area; the earliest one wins ties
pub fn largest_face(faces: &[FaceRect]) -> Option<FaceRect> {
    faces.iter().fold(None, |best: Option<FaceRect>, face| match best {
        Some(b) if b.area() >= face.area() => Some(b),
        _ => Some(*face),
    })
}

/// SeetaFace detector
pub struct SeetaFaceLocator {
    detector: Box<dyn rustface::Detector>,
}

impl SeetaFaceLocator {
    /// Load the model and apply the detector settings
    pub fn load(model_path: &Path, settings: &FaceSettings) -> Result<Self, FaceError> {
        let path_str = model_path.to_str().ok_or_else(|| FaceError::ModelLoad {
            path: model_path.to_path_buf(),
            reason: "path is not valid UTF-8".into(),
        })?;
        settings
            .check_detector_params()
            .map_err(|reason| FaceError::ModelLoad {
                path: model_path.to_path_buf(),
                reason,
            })?;

        let mut detector =
            rustface::create_detector(path_str).map_err(|e| FaceError::ModelLoad {
                path: model_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        detector.set_min_face_size(settings.min_face_size.max(20));
        detector.set_score_thresh(settings.score_threshold);
        detector.set_pyramid_scale_factor(settings.pyramid_scale_factor);
        let step = settings.slide_window_step.max(1);
        detector.set_slide_window_step(step, step);

        info!(
            model = %model_path.display(),
            min_face_size = settings.min_face_size,
            "Face detector loaded"
        );
        Ok(Self { detector })
    }
}

impl FaceLocator for SeetaFaceLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceRect>, FaceError> {
        let start = std::time::Instant::now();
        let gray = image::imageops::grayscale(&frame.image);
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(FaceError::DetectorFailure("empty frame".into()));
        }

        let data = rustface::ImageData::new(gray.as_raw(), width, height);
        let detections = self.detector.detect(&data);

        let frame_size = frame.size();
        let faces: Vec<FaceRect> = detections
            .iter()
            .filter_map(|info| {
                let bbox = info.bbox();
                FaceRect::clamped(bbox.x(), bbox.y(), bbox.width(), bbox.height(), frame_size)
            })
            .collect();

        trace!(
            count = faces.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Face detection complete"
        );
        Ok(faces)
    }
}

/// Locator used when no model is configured
///
/// Every call fails, so face mode reports "no face" without stopping recording.
#[derive(Debug, Default)]
pub struct DisabledLocator {
    reason: String,
}

impl DisabledLocator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl FaceLocator for DisabledLocator {
    fn locate(&mut self, _frame: &Frame) -> Result<Vec<FaceRect>, FaceError> {
        Err(FaceError::DetectorFailure(self.reason.clone()))
    }
}

/// Build the locator described by `settings`
///
/// A missing or broken model is not fatal: the session runs with a
/// [`DisabledLocator`] and face mode simply never finds anything.
pub fn create_locator(settings: &FaceSettings) -> Box<dyn FaceLocator> {
    match settings.model_path.as_deref() {
        Some(path) => match SeetaFaceLocator::load(path, settings) {
            Ok(locator) => Box::new(locator),
            Err(e) => {
                warn!(error = %e, "Face detection disabled");
                Box::new(DisabledLocator::new(e.to_string()))
            }
        },
        None => {
            debug!("No face model configured");
            Box::new(DisabledLocator::new("no face model configured"))
        }
    }
}
