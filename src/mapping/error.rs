//! Error definitions for the mapping module

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading databases or configuration.
///
/// Individual bad records and lines are not errors; the loader skips them and
/// counts them in its [`crate::mapping::loader::LoadReport`].
#[derive(Debug, Error)]
pub enum MappingError {
    /// A database or config file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The structured database is not a JSON array
    #[error("Structured database is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A delimited line handed directly to the compiler could not be parsed
    #[error("Malformed mapping line: {0}")]
    MalformedLine(String),

    /// The configuration file is not valid TOML
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}
