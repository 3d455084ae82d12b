use std::fmt;

use serde::{Deserialize, Serialize};

/// Camera family, which decides the calibration strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraProfile {
    /// Uncooled DSLR shooting vendor raw files. Needs a bias master and a
    /// dark master, and benefits from dark optimization.
    #[default]
    Dslr,
    /// Cooled one-shot-color astro camera writing FITS. Darks are taken at
    /// the sensor set point, so they are supplied pre-built.
    CooledOsc,
}

impl CameraProfile {
    /// Parse a user-supplied profile token (case-insensitive).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "CANON_DSLR" | "DSLR" => Some(Self::Dslr),
            "ZWO_OSC" | "COOLED_OSC" | "OSC" => Some(Self::CooledOsc),
            _ => None,
        }
    }

    /// Raw file extensions (lowercase, without dot) produced by this camera.
    pub fn raw_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Dslr => &["cr2"],
            Self::CooledOsc => &["fit", "fits"],
        }
    }

    pub fn capabilities(self) -> CameraCapabilities {
        match self {
            Self::Dslr => CameraCapabilities {
                ingestion: Ingestion::Raw,
                requires_offset_master: true,
                builds_dark_master: true,
                dark_optimization: true,
                bias_in_lights: true,
            },
            Self::CooledOsc => CameraCapabilities {
                ingestion: Ingestion::Generic,
                requires_offset_master: false,
                builds_dark_master: false,
                dark_optimization: false,
                bias_in_lights: false,
            },
        }
    }
}

impl fmt::Display for CameraProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dslr => write!(f, "DSLR"),
            Self::CooledOsc => write!(f, "Cooled OSC"),
        }
    }
}

/// How raw files are brought into the process directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ingestion {
    /// Vendor raw sensor conversion (`convertraw`).
    Raw,
    /// Generic FITS conversion (`convert`).
    Generic,
}

/// Everything the stages need to know about a camera, selected once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraCapabilities {
    pub ingestion: Ingestion,
    /// A standalone offset (bias) master stage runs before flats and darks.
    pub requires_offset_master: bool,
    /// A dark master is built from the DARK directory.
    pub builds_dark_master: bool,
    /// Light calibration scales the dark to each frame.
    pub dark_optimization: bool,
    /// Light calibration subtracts the bias master explicitly.
    pub bias_in_lights: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_case_insensitive() {
        assert_eq!(CameraProfile::from_token("canon_dslr"), Some(CameraProfile::Dslr));
        assert_eq!(CameraProfile::from_token("Zwo_Osc"), Some(CameraProfile::CooledOsc));
        assert_eq!(CameraProfile::from_token("cooled_osc"), Some(CameraProfile::CooledOsc));
        assert_eq!(CameraProfile::from_token("mono"), None);
    }

    #[test]
    fn cooled_osc_skips_offset_and_optimization() {
        let caps = CameraProfile::CooledOsc.capabilities();
        assert!(!caps.requires_offset_master);
        assert!(!caps.dark_optimization);
        assert!(!caps.bias_in_lights);
        assert_eq!(caps.ingestion, Ingestion::Generic);
    }
}
