//! Pipeline subcommand handlers.

use super::HandlerResult;
use crate::config::{CacheConfig, DetectionConfig};
use crate::error::PipelineError;
use crate::pipeline::{Orchestrator, PipelineVariant};
use crate::runtime::RuntimeResolver;
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// `detect-align-and-survive SLIDES_DIR OUTPUT_DIR`
pub fn handle_detect_align_survive(slides_dir: &Path, output_dir: &Path) -> HandlerResult {
    execute(
        RuntimeResolver::new(),
        PipelineVariant::DetectionIncluded {
            slides_dir: slides_dir.to_path_buf(),
        },
        output_dir,
    )
}

/// `align TUMOR_DIR TIL_DIR OUTPUT_DIR`
pub fn handle_align(tumor_dir: &Path, til_dir: &Path, output_dir: &Path) -> HandlerResult {
    execute(
        RuntimeResolver::new(),
        PipelineVariant::AlignOnly {
            tumor_dir: tumor_dir.to_path_buf(),
            til_dir: til_dir.to_path_buf(),
        },
        output_dir,
    )
}

/// `align-and-survive TUMOR_DIR TIL_DIR SURVIVAL_CSV OUTPUT_DIR`
pub fn handle_align_survive(
    tumor_dir: &Path,
    til_dir: &Path,
    survival_csv: &Path,
    output_dir: &Path,
) -> HandlerResult {
    execute(
        RuntimeResolver::new(),
        PipelineVariant::AlignAndSurvive {
            tumor_dir: tumor_dir.to_path_buf(),
            til_dir: til_dir.to_path_buf(),
            survival_csv: survival_csv.to_path_buf(),
        },
        output_dir,
    )
}

/// Shared flow: resolve a backend first (before touching the
/// filesystem), then hand over to the orchestrator.
fn execute(resolver: RuntimeResolver, variant: PipelineVariant, output_dir: &Path) -> HandlerResult {
    let backend = match resolver.resolve() {
        Ok(backend) => backend,
        Err(err) => return fail(err),
    };
    println!("{} container runtime: {}", "using".green().bold(), backend);
    info!(%backend, "runtime resolved");

    let cache = CacheConfig::from_env();
    let detection = DetectionConfig::from_env();
    let mut orchestrator = Orchestrator::new(backend, cache);

    match orchestrator.run(variant, output_dir, &detection) {
        Ok(report) => {
            println!(
                "{} {} stage(s) completed, outputs under {}",
                "done:".green().bold(),
                report.stages.len(),
                output_dir.display()
            );
            HandlerResult::Success
        }
        Err(err) => fail(err),
    }
}

fn fail(err: PipelineError) -> HandlerResult {
    eprintln!("{} {err}", "error:".red().bold());
    if let Some(hint) = err.remediation() {
        eprintln!("{} {hint}", "hint:".yellow().bold());
    }
    HandlerResult::Error(err.exit_code())
}
