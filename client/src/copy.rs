//! Artifact copy between references.
//!
//! Copies the config blob, every layer blob and finally the manifest
//! bytes themselves, so the destination manifest digest matches the
//! source exactly. Copying an image index is explicitly unsupported.

use orca_core::error::{OrcaError, Result};
use orca_core::media_type;

use crate::manifest::ManifestKind;
use crate::transport::RegistryTransport;

/// Copy the artifact at `src` to `dst`. Returns the manifest digest.
pub async fn copy_artifact<T: RegistryTransport>(
    transport: &T,
    src: &str,
    dst: &str,
) -> Result<String> {
    let (bytes, _) = transport
        .pull_manifest_raw(src, media_type::MANIFEST_ACCEPT_TYPES)
        .await?;
    let kind = ManifestKind::from_slice(&bytes)?;

    let manifest = match &kind {
        ManifestKind::Manifest(manifest) => manifest,
        ManifestKind::Index(_) => {
            return Err(OrcaError::UnsupportedIndexOperation(
                "copy of an image index".to_string(),
            ));
        }
    };

    // Blobs first (config then layers), manifest last, so the destination
    // never references blobs it does not hold.
    let config_data = transport.pull_blob(src, &manifest.config.digest).await?;
    transport
        .push_blob(dst, &config_data, &manifest.config.digest)
        .await?;

    for layer in &manifest.layers {
        let data = transport.pull_blob(src, &layer.digest).await?;
        transport.push_blob(dst, &data, &layer.digest).await?;
    }

    let content_type = kind.content_type().to_string();
    let manifest_digest = transport.push_manifest_raw(dst, bytes, &content_type).await?;

    tracing::info!(src = %src, dst = %dst, digest = %manifest_digest, "Artifact copied");
    Ok(manifest_digest)
}
