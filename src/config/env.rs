// src/config/env.rs
// Environment overrides for the run configuration

use tracing::debug;

pub const MODE_VAR: &str = "AGENT_PROTOCOL_MODE";
pub const TARGET_FUNCTION_VAR: &str = "AGENT_PROTOCOL_TARGET_FUNCTION";
pub const DEBUG_VAR: &str = "AGENT_PROTOCOL_DEBUG";

/// Values read from environment variables; None means "not set"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Run mode name (AGENT_PROTOCOL_MODE)
    pub mode: Option<String>,
    /// Solve-unit function name (AGENT_PROTOCOL_TARGET_FUNCTION)
    pub target_function: Option<String>,
    /// Verbose library logging (AGENT_PROTOCOL_DEBUG)
    pub debug: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let config = Self {
            mode: read(MODE_VAR),
            target_function: read(TARGET_FUNCTION_VAR),
            debug: read(DEBUG_VAR).and_then(|v| parse_bool(&v)).unwrap_or(false),
        };
        debug!(?config, "Loaded environment overrides");
        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
