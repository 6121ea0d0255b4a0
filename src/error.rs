use std::path::PathBuf;
use thiserror::Error;

/// Which user-supplied input a validation failure refers to.
///
/// The role decides the numeric exit code: the primary input directory
/// (slides or tumor predictions) maps to 5, the TIL prediction directory
/// to 6 and the survival CSV to 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Slides,
    Tumor,
    Til,
    SurvivalCsv,
}

impl InputRole {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Slides => "slide directory",
            Self::Tumor => "tumor prediction directory",
            Self::Til => "TIL prediction directory",
            Self::SurvivalCsv => "survival CSV",
        }
    }

    fn exit_code(&self) -> u8 {
        match self {
            Self::Slides | Self::Tumor => 5,
            Self::Til => 6,
            Self::SurvivalCsv => 7,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no container runtime found (looked for singularity and docker)")]
    NoRuntimeFound,

    #[error("{backend} is installed but not usable: {reason}")]
    RuntimeUnusable {
        backend: &'static str,
        reason: String,
    },

    #[error("{} not found: {}", role.describe(), path.display())]
    InputMissing { role: InputRole, path: PathBuf },

    #[error("survival CSV {} is missing required column '{column}'", path.display())]
    CsvSchema { path: PathBuf, column: String },

    #[error("stage '{stage}' failed with exit code {code}")]
    StageFailed { stage: String, code: i32 },

    #[error("stage '{stage}' was terminated by a signal")]
    StageInterrupted { stage: String },

    #[error("filesystem operation failed on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Numeric exit-code contract: 3 runtime unusable, 4 no runtime,
    /// 5/6/7 per missing input role. Failing stages surface their own
    /// code; everything unexpected falls back to 7.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoRuntimeFound => 4,
            Self::RuntimeUnusable { .. } => 3,
            Self::InputMissing { role, .. } => role.exit_code(),
            Self::CsvSchema { .. } => 7,
            Self::StageFailed { code, .. } => {
                if (1..=255).contains(code) {
                    *code as u8
                } else {
                    7
                }
            }
            Self::StageInterrupted { .. } => 7,
            Self::Io { .. } => 7,
        }
    }

    /// Remediation hint shown alongside the error message, where one is known.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::NoRuntimeFound => Some(
                "install singularity (preferred, runs unprivileged) or docker and make sure it is on PATH",
            ),
            Self::RuntimeUnusable { backend, .. } => match *backend {
                "docker" => Some(
                    "check that the docker daemon is running and that your user is in the docker group",
                ),
                "singularity" => Some(
                    "check free space in the image cache directory (TIL_PIPELINE_CACHE_DIR) and network access to the registry",
                ),
                _ => None,
            },
            Self::CsvSchema { .. } => Some(
                "the survival CSV must carry the columns slideID, survivalA and censorA.0yes.1no",
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
