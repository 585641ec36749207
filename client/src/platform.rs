//! Platform specifications and index-entry matching.
//!
//! A platform is the (os, architecture, variant) tuple identifying which
//! environment a manifest targets. Matching is exact on os and
//! architecture; a variant named in the request must be matched exactly,
//! while a request without a variant prefers variant-less candidates and
//! falls back to variant-carrying ones.

use orca_core::error::{OrcaError, Result};
use serde::{Deserialize, Serialize};

use crate::manifest::{ImageIndex, IndexEntry};

/// Platform an index entry targets, or a resolution target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    /// Operating system (e.g. "linux")
    pub os: String,
    /// CPU architecture (e.g. "amd64", "arm64")
    pub architecture: String,
    /// OS version (mostly used by Windows images)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    /// Required OS features
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_features: Option<Vec<String>>,
    /// Architecture variant (e.g. "v8" for arm64)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl Platform {
    /// Create a platform with just os and architecture.
    pub fn new(os: impl Into<String>, architecture: impl Into<String>) -> Self {
        Platform {
            os: os.into(),
            architecture: architecture.into(),
            os_version: None,
            os_features: None,
            variant: None,
        }
    }

    /// Create a platform with an architecture variant.
    pub fn with_variant(
        os: impl Into<String>,
        architecture: impl Into<String>,
        variant: impl Into<String>,
    ) -> Self {
        Platform {
            variant: Some(variant.into()),
            ..Platform::new(os, architecture)
        }
    }

    /// Parse an `os/arch[/variant]` specification string.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let mut parts = spec.split('/');
        let os = parts.next().unwrap_or_default();
        let architecture = parts.next().unwrap_or_default();
        let variant = parts.next();

        if os.is_empty() || architecture.is_empty() || parts.next().is_some() {
            return Err(OrcaError::InvalidReference(format!(
                "invalid platform spec '{}', expected os/arch[/variant]",
                spec
            )));
        }

        Ok(Platform {
            os: os.to_string(),
            architecture: architecture.to_string(),
            os_version: None,
            os_features: None,
            variant: variant.map(|v| v.to_string()),
        })
    }

    /// Whether a candidate platform satisfies this requested platform.
    ///
    /// os and architecture must be equal. A requested variant must be
    /// matched exactly by the candidate; without a requested variant, any
    /// candidate variant is acceptable (preference among them is the
    /// matcher's concern, not this predicate's).
    pub fn satisfied_by(&self, candidate: &Platform) -> bool {
        if self.os != candidate.os || self.architecture != candidate.architecture {
            return false;
        }
        match &self.variant {
            Some(requested) => candidate.variant.as_deref() == Some(requested.as_str()),
            None => true,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(ref variant) = self.variant {
            write!(f, "/{}", variant)?;
        }
        Ok(())
    }
}

/// Select the index entry matching a requested platform.
///
/// Among candidates satisfying os+arch where the request names no variant,
/// an entry without a variant is preferred as the default; entries with a
/// variant remain acceptable fallbacks. Remaining ties break in index
/// order. Entries without platform metadata never match.
pub fn find_match<'a>(requested: &Platform, entries: &'a [IndexEntry]) -> Result<&'a IndexEntry> {
    let mut fallback: Option<&IndexEntry> = None;

    for entry in entries {
        let Some(candidate) = &entry.platform else {
            continue;
        };
        if !requested.satisfied_by(candidate) {
            continue;
        }
        if requested.variant.is_some() || candidate.variant.is_none() {
            // Exact on all requested fields, or the preferred
            // variant-less default.
            return Ok(entry);
        }
        fallback.get_or_insert(entry);
    }

    fallback.ok_or_else(|| OrcaError::PlatformNotFound {
        platform: requested.to_string(),
    })
}

/// List the platforms an index advertises, in entry order.
///
/// Entries without platform metadata contribute `None`.
pub fn list_platforms(index: &ImageIndex) -> Vec<(String, Option<Platform>)> {
    index
        .manifests
        .iter()
        .map(|entry| (entry.digest.clone(), entry.platform.clone()))
        .collect()
}
