//! Error types for STAC validation.
//!
//! Only [`ConfigError`] aborts a run. Everything else is caught at the
//! entry boundary by the orchestrator and turned into report data.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors. These abort the whole run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no path or URL specified")]
    NoInput,

    #[error("schema folder is not a valid directory: {path}")]
    SchemaFolderNotADirectory { path: PathBuf },

    #[error("config file does not exist: {path}")]
    ConfigFileNotFound { path: PathBuf },

    #[error("config file is invalid JSON: {source}")]
    ConfigFileInvalid {
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to load a single document. Isolated to its entry.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("protocol not supported: {scheme}")]
    UnsupportedProtocol { scheme: String },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to resolve, load or compile one schema. Isolated to its slot.
/// Cloneable so failed loads can be cached and reported without re-fetching.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("'stac_extensions' must contain a valid schema URL, not a shortcut: '{entry}'")]
    Shortcut { entry: String },

    #[error("'stac_extensions' must contain 'projection' instead of 'proj'")]
    ProjShortcut,

    #[error("schema at '{uri}' not found. Please ensure all entries in 'stac_extensions' are valid")]
    NotFound { uri: String },

    #[error("failed to load schema from '{uri}': {message}")]
    Load { uri: String, message: String },

    #[error("schema at '{uri}' is not a valid JSON Schema: {message}")]
    Compile { uri: String, message: String },
}

impl SchemaError {
    pub(crate) fn load(uri: &str, error: &DocumentError) -> Self {
        match error {
            DocumentError::FileNotFound { .. } => SchemaError::NotFound {
                uri: uri.to_string(),
            },
            #[cfg(feature = "remote")]
            DocumentError::Network { source, .. }
                if source.status() == Some(reqwest::StatusCode::NOT_FOUND) =>
            {
                SchemaError::NotFound {
                    uri: uri.to_string(),
                }
            }
            other => SchemaError::Load {
                uri: uri.to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl ConfigError {
    /// Exit code for fatal errors; entry-level failures never reach the
    /// exit code directly, it is derived from the summary counts.
    pub fn exit_code(&self) -> i32 {
        2
    }
}
