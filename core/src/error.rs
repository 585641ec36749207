use std::path::PathBuf;

use thiserror::Error;

/// Orca error types
#[derive(Error, Debug)]
pub enum OrcaError {
    /// Local file missing during assembly
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Malformed manifest JSON from the transport
    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    /// Operation not supported on an image index
    #[error("Unsupported index operation: {0}")]
    UnsupportedIndexOperation(String),

    /// No index entry matches the requested platform
    #[error("No matching platform: {platform}")]
    PlatformNotFound { platform: String },

    /// Tar unpacking capability is not configured
    #[error("Tar extraction support is not available")]
    MissingExtractionDependency,

    /// Image reference could not be parsed
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Opaque failure surfaced unchanged from the registry transport
    #[error("Registry error: {registry} - {message}")]
    Transport { registry: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for OrcaError {
    fn from(err: serde_json::Error) -> Self {
        OrcaError::Serialization(err.to_string())
    }
}

/// Result type alias for orca operations
pub type Result<T> = std::result::Result<T, OrcaError>;
