use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::{
    DEFAULT_FILTER_FWHM, DEFAULT_FILTER_ROUND, DEFAULT_FILTER_WFWHM, DEFAULT_SEQUENCE_START,
    DEFAULT_WORKERS, MIN_SUPPLIED_OPTIONS, PROCESS_DIR,
};
use crate::error::{Result, StarprepError};
use crate::profile::{CameraCapabilities, CameraProfile};

/// Raw, unvalidated run options as the user supplied them, either on the
/// command line or in a TOML file. Every field is optional; a field that is
/// `Some` counts as a supplied option.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    pub camera: Option<String>,
    pub base_dir: Option<PathBuf>,
    #[serde(deserialize_with = "scalar_as_string")]
    pub sequence_start: Option<String>,
    pub master_dark: Option<PathBuf>,
    pub master_bias: Option<PathBuf>,
    pub target: Option<String>,
    pub process: Option<String>,
    #[serde(deserialize_with = "scalar_as_string")]
    pub filter_fwhm: Option<String>,
    #[serde(deserialize_with = "scalar_as_string")]
    pub filter_wfwhm: Option<String>,
    #[serde(deserialize_with = "scalar_as_string")]
    pub filter_round: Option<String>,
    #[serde(deserialize_with = "scalar_as_string")]
    pub cpus: Option<String>,
    #[serde(deserialize_with = "scalar_as_string")]
    pub reference: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
}

/// Accept `filter_fwhm = 5`, `filter_fwhm = 5.5` and `filter_fwhm = "5"` alike.
fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|s| match s {
        Scalar::Text(t) => t,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
    }))
}

impl RunOptions {
    /// Number of options that were actually supplied.
    pub fn supplied_count(&self) -> usize {
        [
            self.camera.is_some(),
            self.base_dir.is_some(),
            self.sequence_start.is_some(),
            self.master_dark.is_some(),
            self.master_bias.is_some(),
            self.target.is_some(),
            self.process.is_some(),
            self.filter_fwhm.is_some(),
            self.filter_wfwhm.is_some(),
            self.filter_round.is_some(),
            self.cpus.is_some(),
            self.reference.is_some(),
        ]
        .iter()
        .filter(|supplied| **supplied)
        .count()
    }

    /// Layer `overrides` on top of `self`. Fields set in `overrides` win.
    pub fn merged_with(self, overrides: RunOptions) -> RunOptions {
        RunOptions {
            camera: overrides.camera.or(self.camera),
            base_dir: overrides.base_dir.or(self.base_dir),
            sequence_start: overrides.sequence_start.or(self.sequence_start),
            master_dark: overrides.master_dark.or(self.master_dark),
            master_bias: overrides.master_bias.or(self.master_bias),
            target: overrides.target.or(self.target),
            process: overrides.process.or(self.process),
            filter_fwhm: overrides.filter_fwhm.or(self.filter_fwhm),
            filter_wfwhm: overrides.filter_wfwhm.or(self.filter_wfwhm),
            filter_round: overrides.filter_round.or(self.filter_round),
            cpus: overrides.cpus.or(self.cpus),
            reference: overrides.reference.or(self.reference),
        }
    }

    /// Load options from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| StarprepError::ConfigParse(e.to_string()))
    }
}

/// How far down the pipeline a run goes. Each depth includes every stage of
/// the depths before it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProcessDepth {
    /// Masters and calibrated lights only.
    Preproc,
    /// Preproc, then register the calibrated lights.
    Register,
    /// Register, then stack the registered lights.
    #[default]
    Stack,
}

impl ProcessDepth {
    /// Parse `preproc`/`p`, `reg`/`r` or `stack`/`s` (case-insensitive).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "PREPROC" | "P" => Some(Self::Preproc),
            "REG" | "R" => Some(Self::Register),
            "STACK" | "S" => Some(Self::Stack),
            _ => None,
        }
    }

    /// Whether a run at this depth performs the stages of `other`.
    pub fn includes(self, other: ProcessDepth) -> bool {
        self >= other
    }
}

impl fmt::Display for ProcessDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preproc => write!(f, "preproc"),
            Self::Register => write!(f, "reg"),
            Self::Stack => write!(f, "stack"),
        }
    }
}

/// Frame-quality thresholds applied while stacking registered lights.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityFilters {
    pub fwhm: f32,
    pub wfwhm: f32,
    /// Star roundness, in (0, 1].
    pub roundness: f32,
}

impl Default for QualityFilters {
    fn default() -> Self {
        Self {
            fwhm: DEFAULT_FILTER_FWHM,
            wfwhm: DEFAULT_FILTER_WFWHM,
            roundness: DEFAULT_FILTER_ROUND,
        }
    }
}

/// Which frame the registration aligns the sequence onto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceFrame {
    /// The engine's default, the first frame of the sequence.
    #[default]
    First,
    /// A specific 1-based frame of the calibrated sequence.
    Index(u32),
    /// Two-pass registration: the engine measures every frame first and
    /// picks the best one as reference.
    TwoPass,
}

impl ReferenceFrame {
    /// Parse `first`, `2pass`/`auto`, or a 1-based frame number.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        match token.to_ascii_lowercase().as_str() {
            "first" => Some(Self::First),
            "2pass" | "twopass" | "auto" => Some(Self::TwoPass),
            other => match other.parse::<u32>() {
                Ok(n) if n >= 1 => Some(Self::Index(n)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first frame"),
            Self::Index(n) => write!(f, "frame #{n}"),
            Self::TwoPass => write!(f, "two-pass (best frame)"),
        }
    }
}

/// Validated configuration for one pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunConfiguration {
    pub working_dir: PathBuf,
    pub camera: CameraProfile,
    pub sequence_start: u32,
    pub depth: ProcessDepth,
    pub filters: QualityFilters,
    /// Worker-count hint, passed through to the engine untouched.
    pub workers: u32,
    /// Light frames are read from `LIGHT/<target>`.
    pub target: String,
    pub master_bias: Option<PathBuf>,
    pub master_dark: Option<PathBuf>,
    pub reference: ReferenceFrame,
}

impl RunConfiguration {
    /// Validate `options` into a configuration. `default_dir` is used as the
    /// working directory when none was supplied.
    ///
    /// Touches neither the filesystem nor the engine.
    pub fn resolve(options: &RunOptions, default_dir: &Path) -> Result<Self> {
        let supplied = options.supplied_count();
        if supplied < MIN_SUPPLIED_OPTIONS {
            return Err(StarprepError::config(
                "<options>",
                format!(
                    "at least {MIN_SUPPLIED_OPTIONS} options are required, {supplied} given"
                ),
            ));
        }

        let camera = match options.camera.as_deref() {
            Some(token) => CameraProfile::from_token(token).ok_or_else(|| {
                StarprepError::config(
                    "--camera",
                    format!("unknown camera '{token}' (expected CANON_DSLR or ZWO_OSC)"),
                )
            })?,
            None => CameraProfile::default(),
        };

        let depth = match options.process.as_deref() {
            Some(token) => ProcessDepth::from_token(token).ok_or_else(|| {
                StarprepError::config(
                    "--process",
                    format!("unknown process '{token}' (expected reg, stack or preproc)"),
                )
            })?,
            None => ProcessDepth::default(),
        };

        let reference = match options.reference.as_deref() {
            Some(token) => ReferenceFrame::from_token(token).ok_or_else(|| {
                StarprepError::config(
                    "--reference",
                    format!("expected 'first', '2pass' or a frame number, got '{token}'"),
                )
            })?,
            None => ReferenceFrame::default(),
        };

        let sequence_start = parse_or(
            "--sequencestart",
            options.sequence_start.as_deref(),
            DEFAULT_SEQUENCE_START,
        )?;
        if sequence_start < 1 {
            return Err(StarprepError::config("--sequencestart", "must be at least 1"));
        }

        let workers = parse_or("--cpu", options.cpus.as_deref(), DEFAULT_WORKERS)?;
        if workers < 1 {
            return Err(StarprepError::config("--cpu", "must be at least 1"));
        }

        let filters = QualityFilters {
            fwhm: parse_or("--filterfwhm", options.filter_fwhm.as_deref(), DEFAULT_FILTER_FWHM)?,
            wfwhm: parse_or(
                "--filterwfwhm",
                options.filter_wfwhm.as_deref(),
                DEFAULT_FILTER_WFWHM,
            )?,
            roundness: parse_or(
                "--filterround",
                options.filter_round.as_deref(),
                DEFAULT_FILTER_ROUND,
            )?,
        };
        if !(filters.fwhm > 0.0) {
            return Err(StarprepError::config("--filterfwhm", "must be greater than 0"));
        }
        if !(filters.wfwhm > 0.0) {
            return Err(StarprepError::config("--filterwfwhm", "must be greater than 0"));
        }
        if !(filters.roundness > 0.0 && filters.roundness <= 1.0) {
            return Err(StarprepError::config(
                "--filterround",
                "must be in the range (0, 1]",
            ));
        }

        Ok(Self {
            working_dir: options
                .base_dir
                .clone()
                .unwrap_or_else(|| default_dir.to_path_buf()),
            camera,
            sequence_start,
            depth,
            filters,
            workers,
            target: options.target.clone().unwrap_or_default(),
            master_bias: options.master_bias.clone(),
            master_dark: options.master_dark.clone(),
            reference,
        })
    }

    /// Directory receiving every generated artifact.
    pub fn process_dir(&self) -> PathBuf {
        self.working_dir.join(PROCESS_DIR)
    }

    pub fn capabilities(&self) -> CameraCapabilities {
        self.camera.capabilities()
    }
}

fn parse_or<T: std::str::FromStr>(flag: &str, value: Option<&str>, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| StarprepError::config(flag, format!("'{raw}' is not a valid number"))),
        None => Ok(default),
    }
}
