//! Sequential stage execution.
//!
//! The orchestrator owns the per-run state machine: inputs are
//! validated before any directory is created, stages run strictly in
//! order, and the first required-stage failure aborts everything that
//! follows. Outputs of completed stages are left in place so a re-run
//! can skip redundant work inside the external tools.

use crate::config::{CacheConfig, DetectionConfig};
use crate::error::{PipelineError, Result};
use crate::pipeline::layout::OutputLayout;
use crate::pipeline::runner::{StageRunner, StageStatus, SystemRunner};
use crate::pipeline::stage::{AccessMode, StageSpec};
use crate::pipeline::variant::PipelineVariant;
use crate::report::{RunReport, StageReport};
use crate::runtime::RuntimeBackend;
use chrono::Utc;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Per-run progress. An orchestrator is only constructed with an
/// already-resolved backend, so `RuntimeResolved` is the initial state;
/// `Failed` without a stage index means validation short-circuited the
/// run before any stage began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    RuntimeResolved,
    InputsValidated,
    StageRunning(usize),
    Done,
    Failed { stage: Option<usize> },
}

pub struct Orchestrator<R: StageRunner> {
    backend: RuntimeBackend,
    cache: CacheConfig,
    runner: R,
    state: RunState,
}

impl Orchestrator<SystemRunner> {
    pub fn new(backend: RuntimeBackend, cache: CacheConfig) -> Self {
        Self::with_runner(backend, cache, SystemRunner)
    }
}

impl<R: StageRunner> Orchestrator<R> {
    pub fn with_runner(backend: RuntimeBackend, cache: CacheConfig, runner: R) -> Self {
        Self {
            backend,
            cache,
            runner,
            state: RunState::RuntimeResolved,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Validate, prepare the output tree, then run every stage of the
    /// variant in order against the resolved backend.
    pub fn run(
        &mut self,
        variant: PipelineVariant,
        output_root: &Path,
        detection: &DetectionConfig,
    ) -> Result<RunReport> {
        let variant = match variant.validated() {
            Ok(variant) => variant,
            Err(err) => {
                self.state = RunState::Failed { stage: None };
                return Err(err);
            }
        };
        self.state = RunState::InputsValidated;

        let layout = OutputLayout::create(output_root).inspect_err(|_| {
            self.state = RunState::Failed { stage: None };
        })?;
        let stages = variant.stages(&layout, detection);
        self.prepare_directories(&stages).inspect_err(|_| {
            self.state = RunState::Failed { stage: None };
        })?;

        self.execute(&stages, &layout)
    }

    fn execute(&mut self, stages: &[StageSpec], layout: &OutputLayout) -> Result<RunReport> {
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(stages.len());

        for (index, stage) in stages.iter().enumerate() {
            self.state = RunState::StageRunning(index);
            let invocation = self.backend.build_invocation(stage, &self.cache);
            info!(stage = %stage.name, command = %invocation.rendered(), "starting stage");

            let begun = Instant::now();
            let status = self
                .runner
                .run(&stage.name, &invocation, &stage.log_path())
                .map_err(|e| PipelineError::Io {
                    path: stage.log_path(),
                    source: e,
                });
            let status = match status {
                Ok(status) => status,
                Err(err) => {
                    self.state = RunState::Failed {
                        stage: Some(index),
                    };
                    self.write_report(layout, started_at, reports, false);
                    return Err(err);
                }
            };

            reports.push(StageReport {
                name: stage.name.clone(),
                exit_code: match status {
                    StageStatus::Exited(code) => Some(code),
                    StageStatus::Interrupted => None,
                },
                success: status.success(),
                duration_ms: begun.elapsed().as_millis() as u64,
                log: stage.log_path(),
            });

            if !status.success() {
                if stage.required {
                    self.state = RunState::Failed {
                        stage: Some(index),
                    };
                    let err = match status {
                        StageStatus::Exited(code) => PipelineError::StageFailed {
                            stage: stage.name.clone(),
                            code,
                        },
                        StageStatus::Interrupted => PipelineError::StageInterrupted {
                            stage: stage.name.clone(),
                        },
                    };
                    self.write_report(layout, started_at, reports, false);
                    return Err(err);
                }
                warn!(stage = %stage.name, "optional stage failed, continuing");
            } else {
                info!(stage = %stage.name, "stage completed");
            }
        }

        self.state = RunState::Done;
        Ok(self.write_report(layout, started_at, reports, true))
    }

    /// Create every stage output directory and read-write bind target
    /// with create-if-absent semantics; re-runs over an existing tree
    /// must not fail here.
    fn prepare_directories(&self, stages: &[StageSpec]) -> Result<()> {
        for stage in stages {
            fs::create_dir_all(&stage.output_dir).map_err(|e| PipelineError::Io {
                path: stage.output_dir.clone(),
                source: e,
            })?;
            for bind in &stage.binds {
                if bind.mode == AccessMode::ReadWrite {
                    fs::create_dir_all(&bind.host).map_err(|e| PipelineError::Io {
                        path: bind.host.clone(),
                        source: e,
                    })?;
                }
            }
        }
        Ok(())
    }

    fn write_report(
        &self,
        layout: &OutputLayout,
        started_at: chrono::DateTime<Utc>,
        stages: Vec<StageReport>,
        success: bool,
    ) -> RunReport {
        let report = RunReport {
            backend: self.backend.to_string(),
            started_at,
            finished_at: Utc::now(),
            success,
            stages,
        };
        if let Err(err) = report.write(&layout.run_report()) {
            warn!(%err, "could not write run report");
        }
        report
    }
}
