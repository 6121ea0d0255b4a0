use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "til-pipeline",
    version,
    about = "Containerized tumor/TIL whole-slide-image analysis pipeline",
    long_about = "til-pipeline drives the tumor/TIL detection, spatial alignment and \
survival analysis containers against a locally available container runtime \
(singularity preferred, docker as fallback)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run detection on raw slides, align the predictions and, when
    /// SLIDES_DIR/survival.csv exists, run survival analysis
    #[command(name = "detect-align-and-survive")]
    DetectAlignAndSurvive {
        /// Directory holding the whole-slide images
        slides_dir: PathBuf,
        /// Root directory for all pipeline outputs
        output_dir: PathBuf,
    },

    /// Align pre-existing tumor and TIL predictions
    Align {
        /// Directory holding tumor prediction files
        tumor_dir: PathBuf,
        /// Directory holding TIL prediction files
        til_dir: PathBuf,
        /// Root directory for all pipeline outputs
        output_dir: PathBuf,
    },

    /// Align pre-existing predictions and run survival analysis
    #[command(name = "align-and-survive")]
    AlignAndSurvive {
        /// Directory holding tumor prediction files
        tumor_dir: PathBuf,
        /// Directory holding TIL prediction files
        til_dir: PathBuf,
        /// Survival CSV (slideID, survivalA, censorA.0yes.1no)
        survival_csv: PathBuf,
        /// Root directory for all pipeline outputs
        output_dir: PathBuf,
    },
}
