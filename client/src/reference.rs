//! Image reference parsing.
//!
//! Breaks references like `ghcr.io/org/artifact:v1` or
//! `registry.local:5000/repo@sha256:...` into structured components, and
//! produces the digest-qualified form used to pull an index entry's
//! manifest by digest.

use orca_core::error::{OrcaError, Result};

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// Default tag when neither tag nor digest is specified.
const DEFAULT_TAG: &str = "latest";

/// Parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname, possibly with port (e.g. "ghcr.io", "localhost:5000")
    pub registry: String,
    /// Repository path (e.g. "org/artifact")
    pub repository: String,
    /// Tag, if any
    pub tag: Option<String>,
    /// Digest, if any (e.g. "sha256:abc...")
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse a reference string of the form
    /// `[registry/]repository[:tag][@digest]`.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(OrcaError::InvalidReference(
                "empty image reference".to_string(),
            ));
        }

        // Digest first: everything after the last '@'.
        let (rest, digest) = match reference.rsplit_once('@') {
            Some((rest, digest)) => {
                if !digest.contains(':') {
                    return Err(OrcaError::InvalidReference(format!(
                        "invalid digest in reference '{}': expected algorithm:hex",
                        reference
                    )));
                }
                (rest, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // Tag: a ':' in the last path component. A ':' before the first
        // '/' belongs to a registry port instead.
        let last_slash = rest.rfind('/');
        let (name, tag) = match rest.rfind(':') {
            Some(colon) if colon > last_slash.unwrap_or(0) || last_slash.is_none() => {
                let candidate = &rest[colon + 1..];
                if last_slash.is_none() && candidate.chars().all(|c| c.is_ascii_digit()) {
                    // Bare "host:port" with no path; not a tag.
                    (rest, None)
                } else {
                    (&rest[..colon], Some(candidate.to_string()))
                }
            }
            _ => (rest, None),
        };

        let (registry, repository) = split_registry(name)?;

        // A tag-less, digest-less reference defaults to "latest".
        let tag = match (&tag, &digest) {
            (None, None) => Some(DEFAULT_TAG.to_string()),
            _ => tag,
        };

        Ok(ImageReference {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// The full reference string: `registry/repository[:tag][@digest]`.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.repository);
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }

    /// A digest-qualified copy of this reference, with any tag dropped.
    ///
    /// Used to pull an index entry's manifest by digest.
    pub fn with_digest(&self, digest: &str) -> ImageReference {
        ImageReference {
            registry: self.registry.clone(),
            repository: self.repository.clone(),
            tag: None,
            digest: Some(digest.to_string()),
        }
    }
}

/// Split `name` into registry and repository. The first component is a
/// registry when it looks like a hostname (dot, port, or "localhost").
fn split_registry(name: &str) -> Result<(String, String)> {
    if let Some((first, rest)) = name.split_once('/') {
        if first.contains('.') || first.contains(':') || first == "localhost" {
            if rest.is_empty() {
                return Err(OrcaError::InvalidReference(format!(
                    "empty repository in reference '{}'",
                    name
                )));
            }
            return Ok((first.to_string(), rest.to_string()));
        }
    }

    if name.is_empty() {
        return Err(OrcaError::InvalidReference(
            "empty repository".to_string(),
        ));
    }
    Ok((DEFAULT_REGISTRY.to_string(), name.to_string()))
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}
