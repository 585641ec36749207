//! Artifact resolution: reference in, concrete manifest out.
//!
//! A pulled reference may be a single image manifest or a multi-platform
//! image index. The document is parsed once into [`ManifestKind`]; a
//! concrete manifest is returned directly with no second pull. For an
//! index, current-platform resolution is delegated to the transport's own
//! platform-aware pull, while an explicit target platform is matched
//! locally and the selected entry pulled by digest-qualified reference.

use orca_core::error::{OrcaError, Result};
use orca_core::media_type;

use crate::manifest::{ImageManifest, ManifestKind};
use crate::platform::{find_match, Platform};
use crate::reference::ImageReference;
use crate::transport::RegistryTransport;

/// Resolves references down to the concrete manifest to materialize.
pub struct ArtifactResolver<T> {
    transport: T,
}

impl<T: RegistryTransport> ArtifactResolver<T> {
    /// Create a resolver over the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Pull and parse the manifest document for a reference, along with
    /// its raw bytes and digest. The manifest-vs-index decision is made
    /// here, once.
    pub async fn pull_kind(&self, reference: &str) -> Result<(ManifestKind, Vec<u8>, String)> {
        let (bytes, manifest_digest) = self
            .transport
            .pull_manifest_raw(reference, media_type::MANIFEST_ACCEPT_TYPES)
            .await?;
        let kind = ManifestKind::from_slice(&bytes)?;
        Ok((kind, bytes, manifest_digest))
    }

    /// Resolve a reference to its concrete manifest.
    ///
    /// An index is resolved for the current platform by the transport
    /// collaborator; this core does not reimplement host-platform
    /// detection.
    pub async fn resolve(&self, reference: &str) -> Result<ImageManifest> {
        let (kind, _, _) = self.pull_kind(reference).await?;

        match kind {
            ManifestKind::Manifest(manifest) => Ok(manifest),
            ManifestKind::Index(index) => {
                if index.manifests.is_empty() {
                    return Err(OrcaError::PlatformNotFound {
                        platform: "current platform (index has no entries)".to_string(),
                    });
                }
                tracing::debug!(
                    reference = %reference,
                    entries = index.manifests.len(),
                    "Index reference, delegating current-platform resolution"
                );
                let (manifest, _digest) = self.transport.pull_image_manifest(reference).await?;
                Ok(manifest)
            }
        }
    }

    /// Resolve a reference to the manifest for an explicit target
    /// platform.
    ///
    /// A concrete-manifest reference is returned as-is; there is nothing
    /// to select among. For an index, the matching entry's manifest is
    /// pulled by digest-qualified reference and must itself be concrete.
    pub async fn resolve_platform(
        &self,
        reference: &str,
        platform: &Platform,
    ) -> Result<ImageManifest> {
        let (kind, _, _) = self.pull_kind(reference).await?;

        let index = match kind {
            ManifestKind::Manifest(manifest) => return Ok(manifest),
            ManifestKind::Index(index) => index,
        };

        let entry = find_match(platform, &index.manifests)?;
        let pinned = ImageReference::parse(reference)?
            .with_digest(&entry.digest)
            .full_reference();

        tracing::debug!(
            reference = %reference,
            platform = %platform,
            digest = %entry.digest,
            "Platform matched, pulling entry manifest"
        );

        let (bytes, _) = self
            .transport
            .pull_manifest_raw(&pinned, media_type::MANIFEST_ACCEPT_TYPES)
            .await?;
        match ManifestKind::from_slice(&bytes)? {
            ManifestKind::Manifest(manifest) => Ok(manifest),
            ManifestKind::Index(_) => Err(OrcaError::ManifestParse(format!(
                "index entry {} resolved to another index, expected an image manifest",
                entry.digest
            ))),
        }
    }
}
