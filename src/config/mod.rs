// src/config/mod.rs
// Configuration: config.toml plus environment overrides

pub mod env;
pub mod file;

pub use env::EnvConfig;
pub use file::{ColumnType, ExtractionConfig, GradingConfig, ProtocolConfig, RunConfig};
