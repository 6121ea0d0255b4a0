use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use til_pipeline::handlers::{handle_align, handle_align_survive, handle_detect_align_survive};
use til_pipeline::{Cli, Command};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Wrong argument shape exits 1 with usage; --help/--version stay 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let kind = err.kind();
            let _ = err.print();
            return match kind {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    init_tracing(cli.verbose);

    let result = match &cli.command {
        Command::DetectAlignAndSurvive {
            slides_dir,
            output_dir,
        } => handle_detect_align_survive(slides_dir, output_dir),
        Command::Align {
            tumor_dir,
            til_dir,
            output_dir,
        } => handle_align(tumor_dir, til_dir, output_dir),
        Command::AlignAndSurvive {
            tumor_dir,
            til_dir,
            survival_csv,
            output_dir,
        } => handle_align_survive(tumor_dir, til_dir, survival_csv, output_dir),
    };
    result.into()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("til_pipeline=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
