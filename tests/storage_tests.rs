// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for artifact naming

use chrono::{Local, TimeZone};
use facecam::config::OutputSettings;
use facecam::storage::{ArtifactKind, ArtifactNamer, FsArtifactNamer};
use std::path::{Path, PathBuf};

fn scratch_root() -> PathBuf {
    std::env::temp_dir().join(format!("facecam-storage-{}", uuid::Uuid::new_v4()))
}

fn namer(root: &Path) -> FsArtifactNamer {
    FsArtifactNamer::new(&OutputSettings {
        root: root.to_path_buf(),
        ..Default::default()
    })
}

#[test]
fn test_buckets_created_on_first_use() {
    let root = scratch_root();
    let mut namer = namer(&root);
    assert!(!root.exists());

    let ts = Local.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();
    let path = namer.next_path(ArtifactKind::Video, &ts, "mp4").unwrap();

    assert_eq!(path, root.join("captured_videos").join("video_20240501_101500.mp4"));
    assert!(root.join("captured_videos").is_dir());
    assert!(!root.join("captured_images").exists());
    std::fs::remove_dir_all(root).ok();
}

#[test]
fn test_same_second_gets_counter_suffix() {
    let root = scratch_root();
    let mut namer = namer(&root);
    let ts = Local.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();

    let names: Vec<String> = (0..3)
        .map(|_| {
            let path = namer.next_path(ArtifactKind::Image, &ts, "jpg").unwrap();
            path.file_name().unwrap().to_string_lossy().into_owned()
        })
        .collect();

    assert_eq!(
        names,
        vec![
            "image_20240501_101500.jpg",
            "image_20240501_101500_1.jpg",
            "image_20240501_101500_2.jpg",
        ]
    );
    std::fs::remove_dir_all(root).ok();
}

#[test]
fn test_existing_files_are_not_overwritten() {
    let root = scratch_root();
    let ts = Local.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();
    let dir = root.join("captured_faces");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("face_20240501_101500.jpg"), b"earlier run").unwrap();

    let mut namer = namer(&root);
    let path = namer.next_path(ArtifactKind::FaceImage, &ts, "jpg").unwrap();
    assert_eq!(path, dir.join("face_20240501_101500_1.jpg"));
    std::fs::remove_dir_all(root).ok();
}

#[test]
fn test_face_image_and_video_share_bucket_but_not_names() {
    let root = scratch_root();
    let mut namer = namer(&root);
    let ts = Local.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();

    let image = namer.next_path(ArtifactKind::FaceImage, &ts, "jpg").unwrap();
    let video = namer.next_path(ArtifactKind::FaceVideo, &ts, "mp4").unwrap();

    assert_eq!(image.parent(), video.parent());
    assert_ne!(image, video);
    std::fs::remove_dir_all(root).ok();
}

#[test]
fn test_unwritable_root_is_a_storage_error() {
    let root = scratch_root();
    std::fs::create_dir_all(root.parent().unwrap()).unwrap();
    // A file where the root directory should be
    std::fs::write(&root, b"not a directory").unwrap();

    let mut namer = namer(&root);
    let ts = Local.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();
    assert!(matches!(
        namer.next_path(ArtifactKind::Image, &ts, "jpg"),
        Err(facecam::errors::OutputError::Storage { .. })
    ));
    std::fs::remove_file(root).ok();
}
