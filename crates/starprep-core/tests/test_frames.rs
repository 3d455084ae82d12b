#[allow(dead_code)]
mod common;

use std::path::{Path, PathBuf};

use starprep_core::frames::{count_raw_files, locate, FrameClass};
use starprep_core::profile::CameraProfile;

use common::fill;

#[test]
fn test_light_dir_is_under_target() {
    let dir = FrameClass::Light.source_dir(Path::new("/data/night"), "M31");
    assert_eq!(dir, PathBuf::from("/data/night/LIGHT/M31"));
}

#[test]
fn test_calibration_dir_names() {
    let root = Path::new("/r");
    assert_eq!(FrameClass::Offset.source_dir(root, "x"), PathBuf::from("/r/DARKFLAT"));
    assert_eq!(FrameClass::Dark.source_dir(root, "x"), PathBuf::from("/r/DARK"));
    assert_eq!(FrameClass::Flat.source_dir(root, "x"), PathBuf::from("/r/FLAT"));
}

#[test]
fn test_dslr_counts_only_cr2() {
    let root = tempfile::tempdir().unwrap();
    let flat = root.path().join("FLAT");
    fill(&flat, "flat", "cr2", 3);
    fill(&flat, "upper", "CR2", 2);
    fill(&flat, "other", "fit", 4);

    let located = locate(CameraProfile::Dslr, FrameClass::Flat, root.path(), "");
    assert_eq!(located.directory, flat);
    assert_eq!(located.count, 5);
}

#[test]
fn test_cooled_osc_counts_fit_and_fits() {
    let root = tempfile::tempdir().unwrap();
    let lights = root.path().join("LIGHT").join("M42");
    fill(&lights, "a", "fit", 2);
    fill(&lights, "b", "fits", 3);
    fill(&lights, "c", "cr2", 1);

    let located = locate(CameraProfile::CooledOsc, FrameClass::Light, root.path(), "M42");
    assert_eq!(located.count, 5);
}

#[test]
fn test_counting_is_not_recursive() {
    let root = tempfile::tempdir().unwrap();
    let darks = root.path().join("DARK");
    fill(&darks, "dark", "cr2", 2);
    fill(&darks.join("old"), "dark", "cr2", 6);

    assert_eq!(count_raw_files(&darks, &["cr2"]).unwrap(), 2);
}

#[test]
fn test_missing_dir_counts_zero() {
    let root = tempfile::tempdir().unwrap();
    let located = locate(CameraProfile::Dslr, FrameClass::Dark, root.path(), "");
    assert_eq!(located.count, 0);
    assert!(count_raw_files(&located.directory, &["cr2"]).is_err());
}
