// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for naming and placing captured files
//!
//! Artifacts go into one of four buckets (directories under the output root).
//! Names carry a one-second timestamp; a counter suffix keeps two artifacts
//! issued in the same second from overwriting each other.

use crate::config::OutputSettings;
use crate::constants::output::TIMESTAMP_FORMAT;
use crate::errors::OutputError;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What kind of file is being produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Full-frame still
    Image,
    /// Full-frame recording
    Video,
    /// Still of the face crop
    FaceImage,
    /// Recording of the face crop
    FaceVideo,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Image,
        ArtifactKind::Video,
        ArtifactKind::FaceImage,
        ArtifactKind::FaceVideo,
    ];

    /// File name prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Video => "video",
            ArtifactKind::FaceImage | ArtifactKind::FaceVideo => "face",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Video => "video",
            ArtifactKind::FaceImage => "face image",
            ArtifactKind::FaceVideo => "face video",
        })
    }
}

/// Hands out destination paths for new artifacts
pub trait ArtifactNamer {
    /// Reserve a path for a new artifact of `kind`
    ///
    /// Each returned path is unique for the lifetime of the namer and does
    /// not exist yet at the time of the call.
    fn next_path(
        &mut self,
        kind: ArtifactKind,
        timestamp: &DateTime<Local>,
        extension: &str,
    ) -> Result<PathBuf, OutputError>;
}

/// Base file name without collision suffix, e.g. `face_20240501_101500`
pub fn artifact_stem(kind: ArtifactKind, timestamp: &DateTime<Local>) -> String {
    format!("{}_{}", kind.prefix(), timestamp.format(TIMESTAMP_FORMAT))
}

/// Filesystem namer with one directory per bucket
///
/// Directories are created on first use.
pub struct FsArtifactNamer {
    root: PathBuf,
    image_dir: String,
    video_dir: String,
    face_image_dir: String,
    face_video_dir: String,
    /// Handed out but not on disk yet
    issued: HashSet<PathBuf>,
    created: HashSet<PathBuf>,
}

impl FsArtifactNamer {
    pub fn new(settings: &OutputSettings) -> Self {
        Self {
            root: settings.root.clone(),
            image_dir: settings.image_dir.clone(),
            video_dir: settings.video_dir.clone(),
            face_image_dir: settings.face_image_dir.clone(),
            face_video_dir: settings.face_video_dir.clone(),
            issued: HashSet::new(),
            created: HashSet::new(),
        }
    }

    /// Directory for `kind`
    pub fn bucket_dir(&self, kind: ArtifactKind) -> PathBuf {
        let name = match kind {
            ArtifactKind::Image => &self.image_dir,
            ArtifactKind::Video => &self.video_dir,
            ArtifactKind::FaceImage => &self.face_image_dir,
            ArtifactKind::FaceVideo => &self.face_video_dir,
        };
        self.root.join(name)
    }

    fn ensure_dir(&mut self, dir: &Path) -> Result<(), OutputError> {
        if self.created.contains(dir) {
            return Ok(());
        }
        std::fs::create_dir_all(dir).map_err(|source| OutputError::Storage {
            path: dir.to_path_buf(),
            source,
        })?;
        debug!(dir = %dir.display(), "Created output directory");
        self.created.insert(dir.to_path_buf());
        Ok(())
    }
}

impl ArtifactNamer for FsArtifactNamer {
    fn next_path(
        &mut self,
        kind: ArtifactKind,
        timestamp: &DateTime<Local>,
        extension: &str,
    ) -> Result<PathBuf, OutputError> {
        let dir = self.bucket_dir(kind);
        self.ensure_dir(&dir)?;
        // Written artifacts are covered by the exists check below
        self.issued.retain(|path| !path.exists());

        let stem = artifact_stem(kind, timestamp);
        let mut counter = 0u32;
        loop {
            let name = if counter == 0 {
                format!("{}.{}", stem, extension)
            } else {
                format!("{}_{}.{}", stem, counter, extension)
            };
            let path = dir.join(name);

            if !self.issued.contains(&path) && !path.exists() {
                self.issued.insert(path.clone());
                return Ok(path);
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_written_paths_leave_issued_set() {
        let root = std::env::temp_dir().join(format!("facecam-issued-{}", uuid::Uuid::new_v4()));
        let mut namer = FsArtifactNamer::new(&OutputSettings {
            root: root.clone(),
            ..Default::default()
        });
        let ts = Local.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();

        let first = namer.next_path(ArtifactKind::Image, &ts, "jpg").unwrap();
        std::fs::write(&first, b"jpeg").unwrap();
        let second = namer.next_path(ArtifactKind::Image, &ts, "jpg").unwrap();
        let third = namer.next_path(ArtifactKind::Image, &ts, "jpg").unwrap();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert!(!namer.issued.contains(&first));
        assert_eq!(namer.issued.len(), 2);
        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ArtifactKind::FaceImage.to_string(), "face image");
        assert_eq!(ArtifactKind::Video.to_string(), "video");
    }

    #[test]
    fn test_face_kinds_share_prefix() {
        assert_eq!(ArtifactKind::FaceImage.prefix(), "face");
        assert_eq!(ArtifactKind::FaceVideo.prefix(), "face");
    }

    #[test]
    fn test_artifact_stem_format() {
        let ts = Local.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();
        assert_eq!(artifact_stem(ArtifactKind::Image, &ts), "image_20240501_101500");
    }
}
