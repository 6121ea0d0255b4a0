//! Backend-specific invocation syntax.
//!
//! Singularity and docker express the same {host, container, mode}
//! bindings with structurally different flags; everything downstream of
//! `build_invocation` is backend-agnostic.

use crate::config::CacheConfig;
use crate::pipeline::stage::StageSpec;
use crate::runtime::invocation::Invocation;

/// The resolved container execution backend. Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeBackend {
    /// Preferred: runs unprivileged, presence is a strong usability signal.
    Singularity,
    /// Fallback: presence does not imply permission to use the daemon.
    Docker,
}

impl RuntimeBackend {
    pub fn program(&self) -> &'static str {
        match self {
            Self::Singularity => "singularity",
            Self::Docker => "docker",
        }
    }

    /// Build the backend-specific command for one stage.
    ///
    /// Cache configuration is applied to the child's environment only;
    /// docker manages its own image store and gets none of it.
    pub fn build_invocation(&self, stage: &StageSpec, cache: &CacheConfig) -> Invocation {
        match self {
            Self::Singularity => self.singularity_invocation(stage, cache),
            Self::Docker => self.docker_invocation(stage),
        }
    }

    fn singularity_invocation(&self, stage: &StageSpec, cache: &CacheConfig) -> Invocation {
        let mut inv = Invocation::new(self.program()).args(["exec", "--cleanenv"]);
        for bind in &stage.binds {
            inv = inv.arg("-B").arg(bind.render());
        }
        inv = inv.arg(format!("docker://{}", stage.image));
        inv = inv.args(stage.args.iter().cloned());
        for (key, value) in cache.env_vars() {
            inv = inv.env(key, value);
        }
        inv
    }

    fn docker_invocation(&self, stage: &StageSpec) -> Invocation {
        let mut inv = Invocation::new(self.program()).args(["run", "--rm"]);
        for bind in &stage.binds {
            inv = inv.arg("-v").arg(bind.render());
        }
        inv = inv.arg(stage.image.clone());
        inv.args(stage.args.iter().cloned())
    }
}

impl std::fmt::Display for RuntimeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.program())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::{BindMount, StageSpec};
    use std::path::{Path, PathBuf};

    fn sample_stage() -> StageSpec {
        StageSpec::new("align", "tilpipeline/wsi-align:1.4", PathBuf::from("/out/alignment"))
            .bind(BindMount::read_only(Path::new("/in/tumor"), "/data/tumor"))
            .bind(BindMount::read_write(
                Path::new("/out/alignment"),
                "/data/output",
            ))
            .arg("--tumor")
            .arg("/data/tumor")
    }

    fn cache() -> CacheConfig {
        CacheConfig::under(Path::new("/scratch/til"))
    }

    #[test]
    fn test_docker_syntax() {
        let inv = RuntimeBackend::Docker.build_invocation(&sample_stage(), &cache());
        assert_eq!(inv.program, "docker");
        assert_eq!(
            inv.args,
            vec![
                "run",
                "--rm",
                "-v",
                "/in/tumor:/data/tumor:ro",
                "-v",
                "/out/alignment:/data/output:rw",
                "tilpipeline/wsi-align:1.4",
                "--tumor",
                "/data/tumor",
            ]
        );
        assert!(inv.envs.is_empty());
    }

    #[test]
    fn test_singularity_syntax() {
        let inv = RuntimeBackend::Singularity.build_invocation(&sample_stage(), &cache());
        assert_eq!(inv.program, "singularity");
        assert_eq!(
            inv.args,
            vec![
                "exec",
                "--cleanenv",
                "-B",
                "/in/tumor:/data/tumor:ro",
                "-B",
                "/out/alignment:/data/output:rw",
                "docker://tilpipeline/wsi-align:1.4",
                "--tumor",
                "/data/tumor",
            ]
        );
    }

    #[test]
    fn test_singularity_gets_cache_env() {
        let inv = RuntimeBackend::Singularity.build_invocation(&sample_stage(), &cache());
        assert!(inv
            .envs
            .iter()
            .any(|(k, v)| k == "SINGULARITY_CACHEDIR" && v == "/scratch/til/cache"));
        assert!(inv.envs.iter().any(|(k, _)| k == "SINGULARITY_TMPDIR"));
    }

    #[test]
    fn test_same_bindings_both_backends() {
        let stage = sample_stage();
        let docker = RuntimeBackend::Docker.build_invocation(&stage, &cache());
        let singularity = RuntimeBackend::Singularity.build_invocation(&stage, &cache());

        let docker_binds: Vec<_> = docker
            .args
            .iter()
            .filter(|a| a.contains(":/data/"))
            .collect();
        let singularity_binds: Vec<_> = singularity
            .args
            .iter()
            .filter(|a| a.contains(":/data/"))
            .collect();
        assert_eq!(docker_binds, singularity_binds);
    }

    #[test]
    fn test_display() {
        assert_eq!(RuntimeBackend::Singularity.to_string(), "singularity");
        assert_eq!(RuntimeBackend::Docker.to_string(), "docker");
    }
}
