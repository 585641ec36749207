//! Orca Core - Foundational Types
//!
//! Foundational types shared across the orca crates: the error taxonomy,
//! content digest computation, and the fixed OCI media type constants.

pub mod digest;
pub mod error;
pub mod media_type;

// Re-export commonly used types
pub use digest::sha256_digest;
pub use error::{OrcaError, Result};

/// Orca version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
