use std::path::{Path, PathBuf};

use starprep_core::config::{ProcessDepth, ReferenceFrame, RunConfiguration, RunOptions};
use starprep_core::error::StarprepError;
use starprep_core::profile::CameraProfile;

fn flag_of(err: StarprepError) -> String {
    match err {
        StarprepError::Configuration { flag, .. } => flag,
        other => panic!("expected a configuration error, got {other}"),
    }
}

fn two_options() -> RunOptions {
    RunOptions {
        base_dir: Some(PathBuf::from("/data/night")),
        target: Some("M31".into()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Option floor
// ---------------------------------------------------------------------------

#[test]
fn test_no_options_is_rejected() {
    let err = RunConfiguration::resolve(&RunOptions::default(), Path::new("/cwd")).unwrap_err();
    assert_eq!(flag_of(err), "<options>");
}

#[test]
fn test_single_option_is_rejected() {
    let options = RunOptions {
        target: Some("M31".into()),
        ..Default::default()
    };
    let err = RunConfiguration::resolve(&options, Path::new("/cwd")).unwrap_err();
    assert!(err.to_string().contains("at least 2"), "got: {err}");
}

#[test]
fn test_two_options_are_enough() {
    assert!(RunConfiguration::resolve(&two_options(), Path::new("/cwd")).is_ok());
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[test]
fn test_process_tokens() {
    for (token, depth) in [
        ("reg", ProcessDepth::Register),
        ("R", ProcessDepth::Register),
        ("STACK", ProcessDepth::Stack),
        ("s", ProcessDepth::Stack),
        ("PreProc", ProcessDepth::Preproc),
        ("p", ProcessDepth::Preproc),
    ] {
        let options = RunOptions {
            process: Some(token.into()),
            ..two_options()
        };
        let cfg = RunConfiguration::resolve(&options, Path::new("/cwd")).unwrap();
        assert_eq!(cfg.depth, depth, "token {token}");
    }
}

#[test]
fn test_unknown_process_names_flag() {
    let options = RunOptions {
        process: Some("align".into()),
        ..two_options()
    };
    let err = RunConfiguration::resolve(&options, Path::new("/cwd")).unwrap_err();
    assert_eq!(flag_of(err), "--process");
}

#[test]
fn test_camera_tokens() {
    for (token, camera) in [
        ("canon_dslr", CameraProfile::Dslr),
        ("ZWO_OSC", CameraProfile::CooledOsc),
        ("Cooled_Osc", CameraProfile::CooledOsc),
    ] {
        let options = RunOptions {
            camera: Some(token.into()),
            ..two_options()
        };
        let cfg = RunConfiguration::resolve(&options, Path::new("/cwd")).unwrap();
        assert_eq!(cfg.camera, camera, "token {token}");
    }
}

#[test]
fn test_unknown_camera_names_flag() {
    let options = RunOptions {
        camera: Some("NIKON".into()),
        ..two_options()
    };
    let err = RunConfiguration::resolve(&options, Path::new("/cwd")).unwrap_err();
    assert_eq!(flag_of(err), "--camera");
}

// ---------------------------------------------------------------------------
// Numeric ranges
// ---------------------------------------------------------------------------

#[test]
fn test_filters_are_parsed() {
    let options = RunOptions {
        filter_fwhm: Some("5".into()),
        filter_wfwhm: Some("15".into()),
        filter_round: Some("0.3".into()),
        ..two_options()
    };
    let cfg = RunConfiguration::resolve(&options, Path::new("/cwd")).unwrap();
    assert_eq!(cfg.filters.fwhm, 5.0);
    assert_eq!(cfg.filters.wfwhm, 15.0);
    assert_eq!(cfg.filters.roundness, 0.3);
}

#[test]
fn test_roundness_of_one_is_allowed() {
    let options = RunOptions {
        filter_round: Some("1".into()),
        ..two_options()
    };
    assert!(RunConfiguration::resolve(&options, Path::new("/cwd")).is_ok());
}

#[test]
fn test_out_of_range_values_name_their_flag() {
    let cases: [(fn(&mut RunOptions), &str); 5] = [
        (|o| o.filter_round = Some("0".into()), "--filterround"),
        (|o| o.filter_fwhm = Some("-1".into()), "--filterfwhm"),
        (|o| o.filter_wfwhm = Some("0".into()), "--filterwfwhm"),
        (|o| o.cpus = Some("0".into()), "--cpu"),
        (|o| o.sequence_start = Some("0".into()), "--sequencestart"),
    ];
    for (set, flag) in cases {
        let mut options = two_options();
        set(&mut options);
        let err = RunConfiguration::resolve(&options, Path::new("/cwd")).unwrap_err();
        assert_eq!(flag_of(err), flag);
    }
}

#[test]
fn test_nan_filter_is_rejected() {
    let options = RunOptions {
        filter_fwhm: Some("NaN".into()),
        ..two_options()
    };
    let err = RunConfiguration::resolve(&options, Path::new("/cwd")).unwrap_err();
    assert_eq!(flag_of(err), "--filterfwhm");
}

#[test]
fn test_external_masters_are_kept() {
    let options = RunOptions {
        master_bias: Some(PathBuf::from("/masters/bias.fit")),
        master_dark: Some(PathBuf::from("/masters/dark_-10C.fit")),
        reference: Some("2pass".into()),
        ..two_options()
    };
    let cfg = RunConfiguration::resolve(&options, Path::new("/cwd")).unwrap();
    assert_eq!(cfg.master_bias, Some(PathBuf::from("/masters/bias.fit")));
    assert_eq!(cfg.master_dark, Some(PathBuf::from("/masters/dark_-10C.fit")));
    assert_eq!(cfg.reference, ReferenceFrame::TwoPass);
}

#[test]
fn test_options_file_round_trip_through_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("night.toml");
    std::fs::write(
        &path,
        "camera = \"ZWO_OSC\"\nprocess = \"reg\"\ntarget = \"M31\"\ncpus = 8\n",
    )
    .unwrap();

    let options = RunOptions::from_toml_file(&path).unwrap();
    let cfg = RunConfiguration::resolve(&options, dir.path()).unwrap();
    assert_eq!(cfg.camera, CameraProfile::CooledOsc);
    assert_eq!(cfg.depth, ProcessDepth::Register);
    assert_eq!(cfg.workers, 8);
    assert_eq!(cfg.working_dir, dir.path());
}

#[test]
fn test_malformed_options_file() {
    let err = RunOptions::from_toml_str("camera = [").unwrap_err();
    assert!(matches!(err, StarprepError::ConfigParse(_)));
}
