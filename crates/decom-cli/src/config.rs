//! Settings file for the `decom` binary.
//!
//! Stored as TOML in `~/.decom/config.toml` unless `--config` names another file.
//! Every field is optional; missing values use the library defaults.
//!
//! ```toml
//! [decommit]
//! parallel = true
//! max_stages = 4
//! threads = "auto"
//!
//! [solver]
//! max_iterations = 200
//! tolerance = 1e-8
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use decom_algo::{DecommitConfig, SolverConfig};
use decom_core::DecomError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomConfig {
    pub decommit: DecommitSection,
    pub solver: SolverConfig,
}

/// `[decommit]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecommitSection {
    /// Solve the trials of a stage concurrently
    pub parallel: bool,
    /// Stop after this many accepted stages
    pub max_stages: Option<usize>,
    /// Worker threads ("auto" or a count)
    pub threads: String,
}

impl Default for DecommitSection {
    fn default() -> Self {
        Self {
            parallel: true,
            max_stages: None,
            threads: "auto".to_string(),
        }
    }
}

impl DecomConfig {
    /// Get the default config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".decom"))
    }

    /// Get the default config file path.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load `explicit` if given, else the default file if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| DecomError::Config(e.to_string()))
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Library settings for the decommitment search
    pub fn decommit_config(&self) -> DecommitConfig {
        DecommitConfig {
            parallel: self.decommit.parallel,
            max_stages: self.decommit.max_stages,
            solver: self.solver.clone(),
        }
    }
}
