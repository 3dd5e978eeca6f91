// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the user config directory. Every field has a default,
//! so partial files (or no file at all) are fine. Command line flags are
//! applied on top after loading.

use crate::backends::camera::types::{FrameSize, PixelFormat, SensorRotation};
use crate::constants::{self, BitratePreset};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Where frames come from
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// V4L2 camera device
    #[default]
    V4l2,
    /// Synthetic moving test pattern (no hardware needed)
    Pattern,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct CameraSettings {
    pub source: SourceKind,
    /// V4L2 device node
    pub device: String,
    pub width: u32,
    pub height: u32,
    /// Preferred capture format; `None` tries MJPG, YUYV, RGB3 in that order
    pub pixel_format: Option<PixelFormat>,
    /// Clockwise rotation applied to every frame, in degrees
    pub rotation: i32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            device: constants::capture::DEFAULT_DEVICE.to_string(),
            width: constants::capture::DEFAULT_WIDTH,
            height: constants::capture::DEFAULT_HEIGHT,
            pixel_format: None,
            rotation: constants::capture::DEFAULT_ROTATION_DEGREES,
        }
    }
}

impl CameraSettings {
    pub fn requested_size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn rotation(&self) -> SensorRotation {
        SensorRotation::from_degrees_int(self.rotation)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RecordingSettings {
    /// Main stream frame rate, also the tick cadence for command polling
    pub main_fps: u32,
    /// Face sub-stream frame rate
    pub face_fps: u32,
    pub bitrate_preset: BitratePreset,
    pub jpeg_quality: u8,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            main_fps: constants::recording::DEFAULT_MAIN_FPS,
            face_fps: constants::recording::DEFAULT_FACE_FPS,
            bitrate_preset: BitratePreset::default(),
            jpeg_quality: constants::recording::DEFAULT_JPEG_QUALITY,
        }
    }
}

impl RecordingSettings {
    /// One frame interval at the main stream rate
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.main_fps.max(1) as f64)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct FaceSettings {
    /// SeetaFace model (`seeta_fd_frontal_v1.0.bin`); face mode finds nothing without it
    pub model_path: Option<PathBuf>,
    pub min_face_size: u32,
    pub score_threshold: f64,
    pub pyramid_scale_factor: f32,
    pub slide_window_step: u32,
}

impl Default for FaceSettings {
    fn default() -> Self {
        Self {
            model_path: None,
            min_face_size: constants::face::DEFAULT_MIN_FACE_SIZE,
            score_threshold: constants::face::DEFAULT_SCORE_THRESHOLD,
            pyramid_scale_factor: constants::face::DEFAULT_PYRAMID_SCALE_FACTOR,
            slide_window_step: constants::face::DEFAULT_SLIDE_WINDOW_STEP,
        }
    }
}

impl FaceSettings {
    /// Check the values the detector refuses (it panics on them)
    pub fn check_detector_params(&self) -> Result<(), String> {
        if self.score_threshold.is_nan() || self.score_threshold <= 0.0 {
            return Err(format!(
                "score_threshold must be positive, got {}",
                self.score_threshold
            ));
        }
        if !(0.01..=0.99).contains(&self.pyramid_scale_factor) {
            return Err(format!(
                "pyramid_scale_factor must be within 0.01-0.99, got {}",
                self.pyramid_scale_factor
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub root: PathBuf,
    pub image_dir: String,
    pub video_dir: String,
    pub face_image_dir: String,
    pub face_video_dir: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            image_dir: constants::output::IMAGE_DIR.to_string(),
            video_dir: constants::output::VIDEO_DIR.to_string(),
            face_image_dir: constants::output::FACE_IMAGE_DIR.to_string(),
            face_video_dir: constants::output::FACE_VIDEO_DIR.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file; the terminal UI owns stdout/stderr while running
    pub file: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraSettings,
    pub recording: RecordingSettings,
    pub face: FaceSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

impl Config {
    /// Default config file location (`~/.config/facecam/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("facecam").join("config.json"))
    }

    /// Load from `path`, or from [`Config::default_path`] when `None`
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No config directory, using defaults");
            return Ok(Self::default());
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let config: Config = serde_json::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        config.validate()?;

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }

        // Serializing plain structs cannot fail
        let json = serde_json::to_string_pretty(self).unwrap_or_default();
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "camera size must be non-zero, got {}x{}",
                self.camera.width, self.camera.height
            )));
        }
        if self.recording.main_fps == 0 || self.recording.face_fps == 0 {
            return Err(ConfigError::Invalid(
                "recording frame rates must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.recording.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be 1-100, got {}",
                self.recording.jpeg_quality
            )));
        }
        if self.camera.rotation.rem_euclid(90) != 0 {
            return Err(ConfigError::Invalid(format!(
                "rotation must be a multiple of 90, got {}",
                self.camera.rotation
            )));
        }
        self.face
            .check_detector_params()
            .map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

fn default_output_root() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(constants::output::DEFAULT_FOLDER)
}
