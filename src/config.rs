//! TOML configuration for reduction runs.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Command-line flags are applied on top of the loaded values
//! by the binary.
//!
//! ```toml
//! group_size = 128
//! backend = "gpu"
//! adapter = 1
//! threads = 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::error::{ReduceError, ReduceResult};
use crate::engine::types::GroupSize;

/// Group size used when none is configured.
pub const DEFAULT_GROUP_SIZE: usize = 256;

/// Execution backend for the parallel passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Rayon worker pool.
    #[default]
    Cpu,
    /// `wgpu` compute shaders (requires the `gpu` feature).
    Gpu,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Cpu => f.write_str("cpu"),
            Backend::Gpu => f.write_str("gpu"),
        }
    }
}

/// Settings for one reduction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReduceConfig {
    /// Elements per worker group. Must be at least 2.
    pub group_size: usize,

    pub backend: Backend,

    /// GPU adapter index, as listed by `group-reduce adapters`.
    pub adapter: usize,

    /// Dedicated CPU pool size; `None` uses the global Rayon pool.
    pub threads: Option<usize>,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            backend: Backend::Cpu,
            adapter: 0,
            threads: None,
        }
    }
}

impl ReduceConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ReduceResult<Self> {
        toml::from_str(text).map_err(|e| ReduceError::Config {
            message: e.to_string(),
        })
    }

    /// Loads a configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> ReduceResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReduceError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "loaded reduction configuration");
        Ok(config)
    }

    /// Validated group size.
    pub fn group_size(&self) -> ReduceResult<GroupSize> {
        GroupSize::new(self.group_size)
    }
}
