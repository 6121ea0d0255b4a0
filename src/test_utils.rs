//! Shared test fixtures.

use crate::pipeline::runner::{StageRunner, StageStatus};
use crate::runtime::Invocation;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Records every invocation instead of executing it; individual stages
/// can be configured to report a failure.
pub struct RecordingRunner {
    calls: RefCell<Vec<(String, Invocation)>>,
    failures: HashMap<String, i32>,
}

impl RecordingRunner {
    pub fn ok() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            failures: HashMap::new(),
        }
    }

    pub fn failing(stage: &str, code: i32) -> Self {
        let mut runner = Self::ok();
        runner.failures.insert(stage.to_string(), code);
        runner
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .map(|(_, inv)| inv.clone())
            .collect()
    }
}

impl StageRunner for RecordingRunner {
    fn run(
        &self,
        stage_name: &str,
        invocation: &Invocation,
        _log_path: &Path,
    ) -> io::Result<StageStatus> {
        self.calls
            .borrow_mut()
            .push((stage_name.to_string(), invocation.clone()));
        match self.failures.get(stage_name) {
            Some(code) => Ok(StageStatus::Exited(*code)),
            None => Ok(StageStatus::Exited(0)),
        }
    }
}
