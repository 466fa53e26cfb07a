// src/config/file.rs
// File-based configuration from ~/.agent-protocol/config.toml

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::env::EnvConfig;
use crate::error::Result;
use crate::extract::{DEFAULT_TARGET_FUNCTION, SolutionExtractor};
use crate::modes::{ModeSpec, get_mode_spec};

/// Top-level config structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub grading: GradingConfig,
}

/// Run section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Mode name; validated through the mode registry, never defaulted on error
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
        }
    }
}

fn default_mode() -> String {
    "e2e".to_string()
}

/// Extraction section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_target_function")]
    pub target_function: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            target_function: default_target_function(),
        }
    }
}

fn default_target_function() -> String {
    DEFAULT_TARGET_FUNCTION.to_string()
}

/// Column types understood by the grading engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
    Str,
    Date,
    Bool,
}

/// Input contract of the (external) table grader: key columns, whether row
/// order matters, and per-column types. Carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradingConfig {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub order_sensitive: bool,
    #[serde(default)]
    pub column_types: BTreeMap<String, ColumnType>,
}

impl ProtocolConfig {
    /// Load config from ~/.agent-protocol/config.toml. Defaults only when the
    /// file does not exist; an unreadable or malformed file is an error.
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::config_path())
    }

    /// Like `load_from`, except that a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config = toml::from_str(&contents).inspect_err(|e| {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                })?;
                debug!(path = %path.display(), "Loaded config from file");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load an explicitly named config file; any failure is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded config from file");
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".agent-protocol")
            .join("config.toml")
    }

    /// Environment values win over file values
    pub fn with_env(mut self, env: &EnvConfig) -> Self {
        if let Some(mode) = &env.mode {
            self.run.mode = mode.clone();
        }
        if let Some(target) = &env.target_function {
            self.extraction.target_function = target.clone();
        }
        self
    }

    /// Resolve the configured mode; an unknown name is an error
    pub fn resolve_mode(&self) -> Result<ModeSpec> {
        get_mode_spec(&self.run.mode)
    }

    pub fn solution_extractor(&self) -> Result<SolutionExtractor> {
        SolutionExtractor::new(&self.extraction.target_function)
    }
}
