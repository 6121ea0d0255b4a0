//! Stage descriptors: what to run, mounted where.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "ro",
            Self::ReadWrite => "rw",
        }
    }
}

/// One host-path-to-container-path mapping.
///
/// Host paths must be absolute and canonical before they reach a
/// backend; validation takes care of that, so no shell-special character
/// or relative segment ever leaks into a constructed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub host: PathBuf,
    pub container: String,
    pub mode: AccessMode,
}

impl BindMount {
    pub fn read_only(host: &Path, container: impl Into<String>) -> Self {
        Self {
            host: host.to_path_buf(),
            container: container.into(),
            mode: AccessMode::ReadOnly,
        }
    }

    pub fn read_write(host: &Path, container: impl Into<String>) -> Self {
        Self {
            host: host.to_path_buf(),
            container: container.into(),
            mode: AccessMode::ReadWrite,
        }
    }

    /// `host:container:mode`, the shape both backends consume.
    pub fn render(&self) -> String {
        format!(
            "{}:{}:{}",
            self.host.display(),
            self.container,
            self.mode.as_str()
        )
    }
}

/// One external, containerized processing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub name: String,
    pub image: String,
    pub binds: Vec<BindMount>,
    pub args: Vec<String>,
    /// Host directory receiving this stage's outputs and its runtime.log.
    pub output_dir: PathBuf,
    /// A required stage aborts the remaining pipeline on failure.
    pub required: bool,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>, output_dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            binds: Vec::new(),
            args: Vec::new(),
            output_dir,
            required: true,
        }
    }

    pub fn bind(mut self, bind: BindMount) -> Self {
        self.binds.push(bind);
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(crate::pipeline::layout::STAGE_LOG)
    }
}
