//! Fixed output directory tree.
//!
//! Stage N's output directory is stage N+1's input mount; every path
//! below is the single source of truth for that wiring.

use crate::error::{PipelineError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed name of the alignment result consumed by the survival stage.
pub const ALIGNMENT_CSV: &str = "output.csv";
/// Per-stage append-only log file name.
pub const STAGE_LOG: &str = "runtime.log";
/// Machine-readable run summary written under the output root.
pub const RUN_REPORT: &str = "run-report.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Create the output root (idempotently) and canonicalize it so all
    /// derived paths are absolute before command substitution.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|e| PipelineError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        let root = fs::canonicalize(root).map_err(|e| PipelineError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tumor_dir(&self) -> PathBuf {
        self.root.join("tumor")
    }

    pub fn til_dir(&self) -> PathBuf {
        self.root.join("til")
    }

    pub fn alignment_dir(&self) -> PathBuf {
        self.root.join("alignment")
    }

    pub fn survival_dir(&self) -> PathBuf {
        self.root.join("survival")
    }

    pub fn alignment_csv(&self) -> PathBuf {
        self.alignment_dir().join(ALIGNMENT_CSV)
    }

    pub fn run_report(&self) -> PathBuf {
        self.root.join(RUN_REPORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");

        let first = OutputLayout::create(&root).unwrap();
        // second run over the same tree must not fail
        let second = OutputLayout::create(&root).unwrap();
        assert_eq!(first, second);
        assert!(root.is_dir());
    }

    #[test]
    fn test_fixed_relative_subpaths() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::create(dir.path()).unwrap();

        assert_eq!(layout.tumor_dir(), layout.root().join("tumor"));
        assert_eq!(layout.til_dir(), layout.root().join("til"));
        assert_eq!(layout.alignment_dir(), layout.root().join("alignment"));
        assert_eq!(layout.survival_dir(), layout.root().join("survival"));
        assert_eq!(
            layout.alignment_csv(),
            layout.root().join("alignment").join("output.csv")
        );
    }

    #[test]
    fn test_root_is_canonical() {
        let dir = TempDir::new().unwrap();
        let relative_free = OutputLayout::create(dir.path()).unwrap();
        assert!(relative_free.root().is_absolute());
    }
}
