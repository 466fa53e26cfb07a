// src/error.rs
// Error types for agent-protocol
//
// Only configuration-level problems are errors. Alignment and extraction
// failures are ordinary values (see clarify::alignment and extract).

use thiserror::Error;

/// Main error type for the agent-protocol library
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unsupported mode '{name}'; valid modes: {}", .valid.join(", "))]
    UnsupportedMode { name: String, valid: Vec<String> },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("tree-sitter parsing error")]
    TreeSitter,
}

/// Convenience type alias for Result using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl From<ProtocolError> for String {
    fn from(err: ProtocolError) -> Self {
        err.to_string()
    }
}
