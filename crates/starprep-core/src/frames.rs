use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::consts::{DARK_DIR, FLAT_DIR, LIGHT_DIR, OFFSET_DIR};
use crate::error::StarprepError;
use crate::profile::CameraProfile;

/// The four kinds of capture a night produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameClass {
    Offset,
    Dark,
    Flat,
    Light,
}

impl FrameClass {
    /// Sequence name given to converted frames of this class.
    pub fn sequence_name(self) -> &'static str {
        match self {
            Self::Offset => "offset",
            Self::Dark => "dark",
            Self::Flat => "flat",
            Self::Light => "light",
        }
    }

    /// Source directory of this class under `root`. Light frames live in a
    /// per-target subdirectory.
    pub fn source_dir(self, root: &Path, target: &str) -> PathBuf {
        match self {
            Self::Offset => root.join(OFFSET_DIR),
            Self::Dark => root.join(DARK_DIR),
            Self::Flat => root.join(FLAT_DIR),
            Self::Light => root.join(LIGHT_DIR).join(target),
        }
    }
}

impl fmt::Display for FrameClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset => write!(f, "offset"),
            Self::Dark => write!(f, "dark"),
            Self::Flat => write!(f, "flat"),
            Self::Light => write!(f, "light"),
        }
    }
}

/// Where a frame class's raw files live and how many there are.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedFrames {
    pub class: FrameClass,
    pub directory: PathBuf,
    pub count: usize,
}

/// Resolve the source directory of `class` and count its raw files.
///
/// A missing or unreadable directory counts as zero files. The engine is left
/// to report the failure when it tries to convert them.
pub fn locate(
    camera: CameraProfile,
    class: FrameClass,
    root: &Path,
    target: &str,
) -> LocatedFrames {
    let directory = class.source_dir(root, target);
    let count = match count_raw_files(&directory, camera.raw_extensions()) {
        Ok(count) => count,
        Err(err) => {
            warn!(class = %class, error = %err, "Source directory unavailable, counting 0 frames");
            0
        }
    };
    debug!(class = %class, dir = %directory.display(), count, "Located frames");
    LocatedFrames {
        class,
        directory,
        count,
    }
}

/// Count files directly inside `dir` whose extension is one of `extensions`
/// (compared case-insensitively).
pub fn count_raw_files(dir: &Path, extensions: &[&str]) -> Result<usize, StarprepError> {
    if !dir.is_dir() {
        return Err(StarprepError::ResourceNotFound(dir.to_path_buf()));
    }
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if matches {
            count += 1;
        }
    }
    Ok(count)
}
