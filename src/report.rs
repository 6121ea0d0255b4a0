//! Machine-readable run summary.
//!
//! Written as `run-report.json` under the output root after every run,
//! failed ones included, so batch drivers can tell how far a run got
//! without scraping console output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub name: String,
    pub exit_code: Option<i32>,
    pub success: bool,
    pub duration_ms: u64,
    pub log: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub backend: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn write(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
