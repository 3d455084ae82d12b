/// Source directory holding bias (DSLR) or dark-flat (cooled OSC) frames.
pub const OFFSET_DIR: &str = "DARKFLAT";

/// Source directory holding dark frames.
pub const DARK_DIR: &str = "DARK";

/// Source directory holding flat frames.
pub const FLAT_DIR: &str = "FLAT";

/// Parent of the per-target light frame directories.
pub const LIGHT_DIR: &str = "LIGHT";

/// Directory that receives every generated or intermediate artifact.
pub const PROCESS_DIR: &str = "process";

pub const MASTER_OFFSET_FILE: &str = "master_offset.fit";
pub const MASTER_FLAT_FILE: &str = "master_flat.fit";
pub const MASTER_DARK_FILE: &str = "master_dark.fit";

/// Prefix the engine gives to calibrated sequences.
pub const CALIBRATED_PREFIX: &str = "pp_";

/// Prefix the engine gives to registered sequences.
pub const REGISTERED_PREFIX: &str = "r_";

/// Output file extension configured on the engine.
pub const OUTPUT_EXTENSION: &str = "fit";

/// `strftime` pattern used in the stacked output filename and run banners.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Rejection thresholds (low, high) for the offset / dark-flat master.
pub const OFFSET_SIGMA: (f32, f32) = (3.0, 3.0);

/// Rejection thresholds (low, high) for the flat master.
pub const FLAT_SIGMA: (f32, f32) = (3.0, 3.0);

/// Rejection thresholds (low, high) for the dark master.
pub const DARK_SIGMA: (f32, f32) = (3.5, 3.5);

/// Rejection thresholds (low, high) for the final light stack.
pub const LIGHT_SIGMA: (f32, f32) = (3.0, 3.0);

/// Default sequence start index handed to conversion.
pub const DEFAULT_SEQUENCE_START: u32 = 1;

/// Default FWHM filter. Loose enough to keep nearly every frame.
pub const DEFAULT_FILTER_FWHM: f32 = 10.0;

/// Default roundness filter, in (0, 1].
pub const DEFAULT_FILTER_ROUND: f32 = 0.1;

/// Default weighted-FWHM filter.
pub const DEFAULT_FILTER_WFWHM: f32 = 30.0;

/// Default worker-count hint passed to the engine.
pub const DEFAULT_WORKERS: u32 = 4;

/// Minimum number of options a run must be given.
pub const MIN_SUPPLIED_OPTIONS: usize = 2;

/// Default name of the Siril command-line executable.
pub const DEFAULT_SIRIL_EXECUTABLE: &str = "siril-cli";

/// Oldest Siril release whose script syntax the generated commands follow.
pub const SIRIL_REQUIRED_VERSION: &str = "1.0.0";
