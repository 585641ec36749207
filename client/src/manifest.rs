//! OCI manifest and index data model, plus the builders that assemble them.
//!
//! Wire structures serialize with the camelCase field names of the OCI
//! image spec (`schemaVersion`, `mediaType`, ...). Optional fields are
//! omitted from the JSON when unset. Whether a pulled document is a
//! manifest or an index is decided exactly once, at parse time, by probing
//! for the `manifests` field; downstream code only ever sees the
//! [`ManifestKind`] union.

use std::collections::BTreeMap;

use orca_core::error::{OrcaError, Result};
use orca_core::{digest, media_type};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Manifest schema version required by the OCI image spec.
pub const SCHEMA_VERSION: u32 = 2;

/// A typed pointer to a content blob: media type, digest, size, and
/// optional annotations/URLs.
///
/// Invariant: `size` equals the exact byte length of the referenced
/// content and `digest` equals the content digest of those bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content
    pub media_type: String,
    /// Content digest (`sha256:<hex>`)
    pub digest: String,
    /// Size of the referenced content in bytes
    pub size: u64,
    /// Optional download URLs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    /// Optional annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl Descriptor {
    /// Build a descriptor for in-memory content, computing digest and size.
    pub fn for_content(media_type: impl Into<String>, content: &[u8]) -> Self {
        Descriptor {
            media_type: media_type.into(),
            digest: digest::sha256_digest(content),
            size: content.len() as u64,
            urls: None,
            annotations: None,
        }
    }
}

/// An index entry: a descriptor pointing at a per-platform manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Media type of the referenced manifest
    pub media_type: String,
    /// Content digest of the referenced manifest
    pub digest: String,
    /// Size of the referenced manifest in bytes
    pub size: u64,
    /// Platform the referenced manifest targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Optional annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// An OCI image manifest: one artifact's config and ordered layer set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    /// Schema version, always 2
    pub schema_version: u32,
    /// Media type of the manifest document itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Semantic kind of the artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    /// Descriptor for the config blob
    pub config: Descriptor,
    /// Descriptors for the layer blobs; order is significant
    pub layers: Vec<Descriptor>,
    /// Subject this manifest refers to (OCI 1.1 referrers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,
    /// Optional annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// An OCI image index: an ordered list of per-platform manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    /// Schema version, always 2
    pub schema_version: u32,
    /// Media type of the index document itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Semantic kind of the artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    /// Referenced manifests; order is significant
    pub manifests: Vec<IndexEntry>,
    /// Subject this index refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,
    /// Optional annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// A pulled manifest document, disambiguated once at parse time.
///
/// An index is distinguished from a concrete manifest purely by the
/// presence of a `manifests` field; there is no separate discriminant.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ManifestKind {
    /// A concrete image manifest
    Manifest(ImageManifest),
    /// A multi-platform image index
    Index(ImageIndex),
}

impl ManifestKind {
    /// Parse raw manifest JSON, deciding manifest-vs-index exactly once.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| OrcaError::ManifestParse(e.to_string()))?;

        if value.get("manifests").is_some() {
            let index: ImageIndex = serde_json::from_value(value)
                .map_err(|e| OrcaError::ManifestParse(e.to_string()))?;
            Ok(ManifestKind::Index(index))
        } else {
            let manifest: ImageManifest = serde_json::from_value(value)
                .map_err(|e| OrcaError::ManifestParse(e.to_string()))?;
            Ok(ManifestKind::Manifest(manifest))
        }
    }

    /// The content type the document should be pushed/served with.
    pub fn content_type(&self) -> &str {
        match self {
            ManifestKind::Manifest(m) => m
                .media_type
                .as_deref()
                .unwrap_or(media_type::IMAGE_MANIFEST),
            ManifestKind::Index(i) => {
                i.media_type.as_deref().unwrap_or(media_type::IMAGE_INDEX)
            }
        }
    }
}

/// Build a structurally valid OCI image manifest from a config descriptor
/// and an ordered list of layer descriptors.
pub fn build_manifest(
    config: Descriptor,
    layers: Vec<Descriptor>,
    annotations: Option<BTreeMap<String, String>>,
    artifact_type: Option<String>,
    subject: Option<Descriptor>,
) -> ImageManifest {
    ImageManifest {
        schema_version: SCHEMA_VERSION,
        media_type: Some(media_type::IMAGE_MANIFEST.to_string()),
        artifact_type,
        config,
        layers,
        subject,
        annotations,
    }
}

/// Build an OCI image index from an ordered list of (descriptor, platform)
/// pairs.
///
/// The per-entry platform is NOT embedded in the emitted entry: platform
/// metadata is not preserved across push/pull by this contract and must be
/// re-derived externally. The pairs are accepted so callers state which
/// platform each member was built for, and so the contract has a single
/// place to change if the gap is ever closed.
pub fn build_index(
    entries: Vec<(Descriptor, Platform)>,
    annotations: Option<BTreeMap<String, String>>,
) -> ImageIndex {
    let manifests = entries
        .into_iter()
        .map(|(descriptor, _platform)| IndexEntry {
            media_type: descriptor.media_type,
            digest: descriptor.digest,
            size: descriptor.size,
            platform: None,
            annotations: descriptor.annotations,
        })
        .collect();

    ImageIndex {
        schema_version: SCHEMA_VERSION,
        media_type: Some(media_type::IMAGE_INDEX.to_string()),
        artifact_type: None,
        manifests,
        subject: None,
        annotations,
    }
}
