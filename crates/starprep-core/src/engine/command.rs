use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::QualityFilters;
use crate::profile::Ingestion;

/// Pixel normalization applied while stacking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalization {
    None,
    /// Multiplicative, used for flats.
    Multiplicative,
    /// Additive with scaling, used for lights.
    AdditiveScale,
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Multiplicative => write!(f, "mul"),
            Self::AdditiveScale => write!(f, "addscale"),
        }
    }
}

/// Parameters of one calibration pass over a sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalibrateParams {
    pub sequence: String,
    pub bias: Option<PathBuf>,
    pub dark: Option<PathBuf>,
    pub flat: Option<PathBuf>,
    /// Treat the data as a color-filter-array mosaic.
    pub cfa: bool,
    pub debayer: bool,
    pub equalize_cfa: bool,
    /// Scale the dark to each frame's thermal signal.
    pub optimize_dark: bool,
    pub prefix: Option<String>,
}

/// Parameters of one sigma-rejection stack.
#[derive(Clone, Debug, PartialEq)]
pub struct StackParams {
    pub sequence: String,
    pub sigma_low: f32,
    pub sigma_high: f32,
    pub normalization: Normalization,
    /// Frame-quality filters; `None` keeps every frame.
    pub filters: Option<QualityFilters>,
    pub output: String,
}

/// One operation the image-processing engine is asked to perform.
///
/// `Display` renders the command in Siril script syntax.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCommand {
    Requires(String),
    Set32Bits,
    SetExt(String),
    SetCpu(u32),
    Cd(PathBuf),
    Convert {
        sequence: String,
        ingestion: Ingestion,
        out: PathBuf,
        start: u32,
    },
    SeqStat {
        sequence: String,
        output: String,
    },
    Calibrate(CalibrateParams),
    SetRef {
        sequence: String,
        index: u32,
    },
    Register {
        sequence: String,
        prefix: Option<String>,
        two_pass: bool,
    },
    ApplyRegistration {
        sequence: String,
        prefix: String,
    },
    Stack(StackParams),
}

impl EngineCommand {
    /// Short verb naming the operation, used in logs and error messages.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Requires(_) => "requires",
            Self::Set32Bits => "set32bits",
            Self::SetExt(_) => "setext",
            Self::SetCpu(_) => "setcpu",
            Self::Cd(_) => "cd",
            Self::Convert {
                ingestion: Ingestion::Raw,
                ..
            } => "convertraw",
            Self::Convert { .. } => "convert",
            Self::SeqStat { .. } => "seqstat",
            Self::Calibrate(_) => "preprocess",
            Self::SetRef { .. } => "setref",
            Self::Register { .. } => "register",
            Self::ApplyRegistration { .. } => "seqapplyreg",
            Self::Stack(_) => "stack",
        }
    }

    /// Session-wide preference, as opposed to a stage operation.
    pub fn is_preference(&self) -> bool {
        matches!(
            self,
            Self::Requires(_) | Self::Set32Bits | Self::SetExt(_) | Self::SetCpu(_)
        )
    }
}

/// Quote an argument if the engine's tokenizer would split it.
fn quoted(arg: &str) -> String {
    if arg.chars().any(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}

fn path_arg(key: &str, path: &Path) -> String {
    quoted(&format!("-{key}={}", path.display()))
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = self.verb();
        match self {
            Self::Requires(version) => write!(f, "{verb} {version}"),
            Self::Set32Bits => write!(f, "{verb}"),
            Self::SetExt(ext) => write!(f, "{verb} {ext}"),
            Self::SetCpu(n) => write!(f, "{verb} {n}"),
            Self::Cd(dir) => write!(f, "{verb} {}", quoted(&dir.display().to_string())),
            Self::Convert {
                sequence,
                out,
                start,
                ..
            } => write!(
                f,
                "{verb} {sequence} {} -start={start}",
                path_arg("out", out)
            ),
            Self::SeqStat { sequence, output } => {
                write!(f, "{verb} {sequence} {} main", quoted(output))
            }
            Self::Calibrate(p) => {
                write!(f, "{verb} {}", p.sequence)?;
                if let Some(ref bias) = p.bias {
                    write!(f, " {}", path_arg("bias", bias))?;
                }
                if let Some(ref dark) = p.dark {
                    write!(f, " {}", path_arg("dark", dark))?;
                }
                if let Some(ref flat) = p.flat {
                    write!(f, " {}", path_arg("flat", flat))?;
                }
                if p.cfa {
                    write!(f, " -cfa")?;
                }
                if p.debayer {
                    write!(f, " -debayer")?;
                }
                if p.equalize_cfa {
                    write!(f, " -equalize_cfa")?;
                }
                if p.optimize_dark {
                    write!(f, " -opt")?;
                }
                if let Some(ref prefix) = p.prefix {
                    write!(f, " -prefix={prefix}")?;
                }
                Ok(())
            }
            Self::SetRef { sequence, index } => write!(f, "{verb} {sequence} {index}"),
            Self::Register {
                sequence,
                prefix,
                two_pass,
            } => {
                write!(f, "{verb} {sequence}")?;
                if *two_pass {
                    write!(f, " -2pass")?;
                }
                if let Some(prefix) = prefix {
                    write!(f, " -prefix={prefix}")?;
                }
                Ok(())
            }
            Self::ApplyRegistration { sequence, prefix } => {
                write!(f, "{verb} {sequence} -prefix={prefix}")
            }
            Self::Stack(p) => {
                write!(
                    f,
                    "{verb} {} rej {} {}",
                    p.sequence, p.sigma_low, p.sigma_high
                )?;
                match p.normalization {
                    Normalization::None => write!(f, " -nonorm")?,
                    norm => write!(f, " -norm={norm}")?,
                }
                if let Some(filters) = p.filters {
                    write!(
                        f,
                        " -filter-round={} -filter-fwhm={} -filter-wfwhm={}",
                        filters.roundness, filters.fwhm, filters.wfwhm
                    )?;
                }
                write!(f, " {}", quoted(&format!("-out={}", p.output)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_uses_raw_verb_for_dslr() {
        let cmd = EngineCommand::Convert {
            sequence: "flat".into(),
            ingestion: Ingestion::Raw,
            out: PathBuf::from("/data/process"),
            start: 1,
        };
        assert_eq!(cmd.to_string(), "convertraw flat -out=/data/process -start=1");
    }

    #[test]
    fn paths_with_spaces_are_quoted() {
        let cmd = EngineCommand::Cd(PathBuf::from("/data/my night/FLAT"));
        assert_eq!(cmd.to_string(), "cd \"/data/my night/FLAT\"");
    }

    #[test]
    fn dark_stack_renders_without_normalization() {
        let cmd = EngineCommand::Stack(StackParams {
            sequence: "pp_dark".into(),
            sigma_low: 3.5,
            sigma_high: 3.5,
            normalization: Normalization::None,
            filters: None,
            output: "master_dark.fit".into(),
        });
        assert_eq!(cmd.to_string(), "stack pp_dark rej 3.5 3.5 -nonorm -out=master_dark.fit");
    }

    #[test]
    fn light_stack_renders_filters() {
        let cmd = EngineCommand::Stack(StackParams {
            sequence: "r_pp_light".into(),
            sigma_low: 3.0,
            sigma_high: 3.0,
            normalization: Normalization::AdditiveScale,
            filters: Some(QualityFilters {
                fwhm: 5.0,
                wfwhm: 15.0,
                roundness: 0.3,
            }),
            output: "stacked.fit".into(),
        });
        assert_eq!(
            cmd.to_string(),
            "stack r_pp_light rej 3 3 -norm=addscale -filter-round=0.3 -filter-fwhm=5 \
             -filter-wfwhm=15 -out=stacked.fit"
        );
    }

    #[test]
    fn dslr_light_calibration_flags() {
        let cmd = EngineCommand::Calibrate(CalibrateParams {
            sequence: "light".into(),
            bias: Some(PathBuf::from("master_offset.fit")),
            dark: Some(PathBuf::from("master_dark.fit")),
            flat: Some(PathBuf::from("master_flat.fit")),
            cfa: true,
            debayer: true,
            equalize_cfa: true,
            optimize_dark: true,
            prefix: Some("pp_".into()),
        });
        assert_eq!(
            cmd.to_string(),
            "preprocess light -bias=master_offset.fit -dark=master_dark.fit \
             -flat=master_flat.fit -cfa -debayer -equalize_cfa -opt -prefix=pp_"
        );
    }

    #[test]
    fn two_pass_register() {
        let cmd = EngineCommand::Register {
            sequence: "pp_light".into(),
            prefix: None,
            two_pass: true,
        };
        assert_eq!(cmd.to_string(), "register pp_light -2pass");
        assert!(!cmd.is_preference());
        assert!(EngineCommand::SetCpu(4).is_preference());
    }
}
