// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use facecam::constants::{BitratePreset, output, overlay};

#[test]
fn test_bitrate_preset_values() {
    // Test that all presets exist (Low, Medium, High)
    assert_eq!(BitratePreset::ALL.len(), 3);
}

#[test]
fn test_bitrate_preset_ordering() {
    // Presets are ordered from lowest to highest quality
    let mut prev_bitrate = 0u32;
    for preset in BitratePreset::ALL {
        let bitrate = preset.bitrate_kbps(1920, 1080);
        assert!(
            bitrate >= prev_bitrate,
            "Presets should be ordered from lowest to highest"
        );
        prev_bitrate = bitrate;
    }
}

#[test]
fn test_bitrate_scales_with_resolution() {
    // Face crops are small, so the lowest tier matters as much as the highest
    let face_bitrate = BitratePreset::Medium.bitrate_kbps(320, 320);
    let hd_bitrate = BitratePreset::Medium.bitrate_kbps(1280, 720);
    let fhd_bitrate = BitratePreset::Medium.bitrate_kbps(1920, 1080);

    assert!(face_bitrate <= hd_bitrate);
    assert!(hd_bitrate < fhd_bitrate);
}

#[test]
fn test_bitrate_preset_display_names() {
    for preset in BitratePreset::ALL {
        let name = preset.display_name();
        assert!(
            !name.is_empty(),
            "Preset {:?} has empty display name",
            preset
        );
    }
}

#[test]
fn test_face_artifacts_share_a_bucket() {
    assert_eq!(output::FACE_IMAGE_DIR, output::FACE_VIDEO_DIR);
    assert_ne!(output::IMAGE_DIR, output::VIDEO_DIR);
}

#[test]
fn test_help_lines_cover_every_key() {
    let joined = overlay::HELP_LINES.join(" ");
    for key in ["'r'", "'c'", "'f'", "'q'"] {
        assert!(joined.contains(key), "help does not mention {}", key);
    }
}
