//! Stage execution.
//!
//! `SystemRunner` launches the backend command and tees its output to
//! the console and the stage's append-only `runtime.log`. Stage
//! execution is deliberately unbounded; only resolver probes carry a
//! timeout.

use crate::runtime::Invocation;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::Stdio;

/// Outcome of one stage process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Exited(i32),
    /// Killed by a signal, no exit code available.
    Interrupted,
}

impl StageStatus {
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

/// Seam between the orchestrator and the host: what gets executed and
/// how. Tests substitute a recording implementation.
pub trait StageRunner {
    fn run(
        &self,
        stage_name: &str,
        invocation: &Invocation,
        log_path: &Path,
    ) -> io::Result<StageStatus>;
}

/// Real execution against the host.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl StageRunner for SystemRunner {
    fn run(
        &self,
        stage_name: &str,
        invocation: &Invocation,
        log_path: &Path,
    ) -> io::Result<StageStatus> {
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        writeln!(
            log,
            "[{}] stage {stage_name}: {}",
            Utc::now().to_rfc3339(),
            invocation.rendered()
        )?;

        let mut child = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stderr is drained on a short-lived helper thread (joined below)
        // while this thread drains stdout, so neither pipe can fill up.
        let stderr = child.stderr.take().expect("stderr was piped");
        let stderr_thread = std::thread::spawn(move || -> Vec<u8> {
            let mut reader = BufReader::new(stderr);
            let mut collected = Vec::new();
            let mut line = Vec::new();
            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let _ = io::stderr().write_all(&line);
                        collected.extend_from_slice(&line);
                    }
                }
            }
            collected
        });

        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut line = Vec::new();
            loop {
                line.clear();
                let n = reader.read_until(b'\n', &mut line)?;
                if n == 0 {
                    break;
                }
                let _ = io::stdout().write_all(&line);
                log.write_all(&line)?;
            }
        }

        let collected_stderr = stderr_thread.join().unwrap_or_default();
        log.write_all(&collected_stderr)?;

        let status = child.wait()?;
        let outcome = match status.code() {
            Some(code) => StageStatus::Exited(code),
            None => StageStatus::Interrupted,
        };
        writeln!(
            log,
            "[{}] stage {stage_name} finished: {:?}",
            Utc::now().to_rfc3339(),
            outcome
        )?;
        Ok(outcome)
    }
}
