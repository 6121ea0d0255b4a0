//! Environment-derived configuration.
//!
//! Tuning knobs for the detection stage and the primary backend's image
//! cache are read from the environment once, at startup, and passed
//! explicitly into invocation construction. Nothing here mutates the
//! process environment.

use std::path::{Path, PathBuf};
use tracing::warn;

/// Worker-count override for the detection stage.
pub const WORKERS_ENV: &str = "TIL_PIPELINE_WORKERS";
/// Batch-size override for the detection stage.
pub const BATCH_SIZE_ENV: &str = "TIL_PIPELINE_BATCH_SIZE";
/// Image cache directory override for the singularity backend.
pub const CACHE_DIR_ENV: &str = "TIL_PIPELINE_CACHE_DIR";

const DEFAULT_WORKERS: u32 = 4;
const DEFAULT_BATCH_SIZE: u32 = 64;
const SHM_CACHE_ROOT: &str = "/dev/shm/til-pipeline";

/// Tuning parameters forwarded to the detection containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionConfig {
    pub workers: u32,
    pub batch_size: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl DetectionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            workers: parse_or_default(&lookup, WORKERS_ENV, DEFAULT_WORKERS),
            batch_size: parse_or_default(&lookup, BATCH_SIZE_ENV, DEFAULT_BATCH_SIZE),
        }
    }
}

fn parse_or_default<F>(lookup: &F, key: &str, default: u32) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => {
                warn!(key, %raw, "ignoring unparsable override, using default");
                default
            }
        },
        None => default,
    }
}

/// Cache and temp directories handed to the singularity backend.
///
/// Prefers a shared-memory-backed path when writable; the docker backend
/// manages its own image store and ignores this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    pub tmp_dir: PathBuf,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let root = match std::env::var(CACHE_DIR_ENV).ok() {
            Some(dir) => PathBuf::from(dir),
            None => default_cache_root(),
        };
        Self::under(&root)
    }

    /// Lay out cache/ and tmp/ under the given root.
    pub fn under(root: &Path) -> Self {
        Self {
            cache_dir: root.join("cache"),
            tmp_dir: root.join("tmp"),
        }
    }

    /// Environment variables to set on the singularity invocation.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        vec![
            (
                "SINGULARITY_CACHEDIR".to_string(),
                self.cache_dir.display().to_string(),
            ),
            (
                "SINGULARITY_TMPDIR".to_string(),
                self.tmp_dir.display().to_string(),
            ),
        ]
    }
}

fn default_cache_root() -> PathBuf {
    let shm = PathBuf::from(SHM_CACHE_ROOT);
    if std::fs::create_dir_all(&shm).is_ok() {
        shm
    } else {
        std::env::temp_dir().join("til-pipeline")
    }
}
