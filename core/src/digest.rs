//! Content digest computation.
//!
//! Blobs and manifests are addressed by the SHA256 digest of their bytes,
//! in the canonical `sha256:<64 lowercase hex>` form. Digests are pure
//! functions of the input: identical byte sequences always produce the
//! identical digest string.

use sha2::{Digest, Sha256};

/// Digest algorithm prefix for the canonical form.
pub const SHA256_PREFIX: &str = "sha256:";

/// Compute the canonical content digest (`sha256:<hex>`) of raw bytes.
pub fn sha256_digest(data: &[u8]) -> String {
    format!("{}{}", SHA256_PREFIX, sha256_hex(data))
}

/// Compute the bare SHA256 hex digest of raw bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Strip the `sha256:` prefix from a canonical digest, if present.
pub fn digest_hex(digest: &str) -> &str {
    digest.strip_prefix(SHA256_PREFIX).unwrap_or(digest)
}
