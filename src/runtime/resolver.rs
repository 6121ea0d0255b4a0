//! Container-runtime resolution.
//!
//! Picks one working backend per run: singularity when present and
//! usable, docker otherwise. Policy decision: both backends are
//! usability-probed before selection, never trusted on presence alone.

use crate::config::CacheConfig;
use crate::error::{PipelineError, Result};
use crate::runtime::backend::RuntimeBackend;
use crate::runtime::invocation::{wait_with_timeout, Invocation};
use std::io::Read;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Reference image pulled and run by the singularity probe.
const PROBE_IMAGE: &str = "docker://alpine:3.19";
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(120);

pub struct RuntimeResolver {
    primary_program: String,
    secondary_program: String,
    probe_timeout: Duration,
}

impl Default for RuntimeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeResolver {
    pub fn new() -> Self {
        Self {
            primary_program: RuntimeBackend::Singularity.program().to_string(),
            secondary_program: RuntimeBackend::Docker.program().to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Override the probed executables. Exists for tests driving fake
    /// backends by absolute path.
    pub fn with_programs(mut self, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        self.primary_program = primary.into();
        self.secondary_program = secondary.into();
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Resolve one working backend, preferring singularity.
    ///
    /// A failing singularity probe falls through to docker; only when no
    /// candidate survives does resolution fail, with the last probe
    /// failure reported as the unusable backend.
    pub fn resolve(&self) -> Result<RuntimeBackend> {
        let mut primary_failure: Option<String> = None;

        if self.locate(&self.primary_program) {
            debug!(program = %self.primary_program, "primary backend located");
            match self.probe_primary() {
                Ok(()) => {
                    info!("resolved container runtime: singularity");
                    return Ok(RuntimeBackend::Singularity);
                }
                Err(reason) => {
                    warn!(%reason, "singularity present but probe failed, trying docker");
                    primary_failure = Some(reason);
                }
            }
        }

        if self.locate(&self.secondary_program) {
            debug!(program = %self.secondary_program, "secondary backend located");
            return match self.probe_secondary() {
                Ok(()) => {
                    info!("resolved container runtime: docker");
                    Ok(RuntimeBackend::Docker)
                }
                Err(reason) => Err(PipelineError::RuntimeUnusable {
                    backend: RuntimeBackend::Docker.program(),
                    reason,
                }),
            };
        }

        match primary_failure {
            Some(reason) => Err(PipelineError::RuntimeUnusable {
                backend: RuntimeBackend::Singularity.program(),
                reason,
            }),
            None => Err(PipelineError::NoRuntimeFound),
        }
    }

    fn locate(&self, program: &str) -> bool {
        std::process::Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    /// Pull and run a trivial reference image against a throwaway cache
    /// directory. The TempDir guarantees the pulled artifact is removed
    /// whatever the probe outcome.
    fn probe_primary(&self) -> std::result::Result<(), String> {
        let scratch =
            TempDir::new().map_err(|e| format!("cannot create probe cache directory: {e}"))?;
        let cache = CacheConfig::under(scratch.path());

        let mut inv = Invocation::new(&self.primary_program)
            .args(["exec", "--cleanenv", PROBE_IMAGE, "/bin/true"]);
        for (key, value) in cache.env_vars() {
            inv = inv.env(key, value);
        }
        self.run_probe(&inv)
    }

    /// List local images: no network dependency, but exercises the
    /// daemon socket and therefore the caller's permission to use it.
    fn probe_secondary(&self) -> std::result::Result<(), String> {
        let inv = Invocation::new(&self.secondary_program).args(["images", "-q"]);
        self.run_probe(&inv)
    }

    fn run_probe(&self, inv: &Invocation) -> std::result::Result<(), String> {
        let mut child = inv
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to start {}: {e}", inv.program))?;

        let status = wait_with_timeout(&mut child, self.probe_timeout)
            .map_err(|e| format!("probe wait failed: {e}"))?;

        match status {
            None => Err(format!(
                "probe timed out after {}s",
                self.probe_timeout.as_secs()
            )),
            Some(status) if status.success() => Ok(()),
            Some(status) => {
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr);
                }
                let detail = stderr.lines().next().unwrap_or("").trim();
                if detail.is_empty() {
                    Err(format!("probe exited with {status}"))
                } else {
                    Err(format!("probe exited with {status}: {detail}"))
                }
            }
        }
    }
}
