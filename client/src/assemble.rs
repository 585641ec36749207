//! Artifact assembly: local files in, pushed manifest out.
//!
//! Assembly is strictly sequential: each file is read, digested and pushed
//! before the next one is touched, then the config blob, then the
//! manifest. A failure at file *k* leaves the blobs for files `0..k-1`
//! uploaded; blob identity is content-addressed, so retrying the whole
//! push is safe and re-uploads are no-ops at the transport level. The
//! manifest is only pushed once every blob landed.

use std::collections::BTreeMap;
use std::path::PathBuf;

use orca_core::error::{OrcaError, Result};
use orca_core::{digest, media_type};

use crate::manifest::{build_manifest, Descriptor};
use crate::transport::RegistryTransport;

/// A local file to be pushed as one artifact layer.
#[derive(Debug, Clone)]
pub struct FileLayer {
    /// Path to the file on disk
    pub path: PathBuf,
    /// Layer media type; defaults to `application/octet-stream`
    pub media_type: Option<String>,
    /// Custom layer annotations
    pub annotations: Option<BTreeMap<String, String>>,
    /// Title recorded under `org.opencontainers.image.title`; defaults to
    /// the file's base name
    pub title: Option<String>,
}

impl FileLayer {
    /// A layer with defaults for everything but the path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLayer {
            path: path.into(),
            media_type: None,
            annotations: None,
            title: None,
        }
    }

    /// Set an explicit media type.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// The title to record for this layer.
    fn effective_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Options applied to a whole assembly.
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Artifact type written into the manifest
    pub artifact_type: Option<String>,
    /// Manifest-level annotations
    pub annotations: Option<BTreeMap<String, String>>,
    /// Media type for the synthesized empty-JSON config blob
    pub config_media_type: Option<String>,
    /// Subject descriptor, for attaching to an existing manifest
    pub subject: Option<Descriptor>,
}

/// Descriptor-level facts about a pushed manifest.
#[derive(Debug, Clone)]
pub struct PushedManifest {
    /// Digest of the manifest bytes
    pub digest: String,
    /// Size of the manifest bytes
    pub size: u64,
    /// Content type the manifest was pushed with
    pub media_type: String,
}

/// Turns local files into pushed blobs, a config blob, and a pushed
/// manifest.
pub struct ArtifactAssembler<T> {
    transport: T,
}

impl<T: RegistryTransport> ArtifactAssembler<T> {
    /// Create an assembler over the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Assemble and push an artifact; returns the manifest digest.
    pub async fn assemble(
        &self,
        reference: &str,
        files: &[FileLayer],
        options: &AssembleOptions,
    ) -> Result<String> {
        Ok(self.assemble_detailed(reference, files, options).await?.digest)
    }

    /// Assemble and push an artifact, returning the descriptor-level
    /// facts needed to reference the manifest from an index.
    pub async fn assemble_detailed(
        &self,
        reference: &str,
        files: &[FileLayer],
        options: &AssembleOptions,
    ) -> Result<PushedManifest> {
        let mut layers = Vec::with_capacity(files.len());

        for file in files {
            let descriptor = self.push_file_layer(reference, file).await?;
            layers.push(descriptor);
        }

        // Minimal config: an empty JSON object, media type overridable.
        let config_data = b"{}".to_vec();
        let config_media_type = options
            .config_media_type
            .clone()
            .unwrap_or_else(|| media_type::DEFAULT_CONFIG.to_string());
        let config = Descriptor::for_content(config_media_type, &config_data);
        self.transport
            .push_blob(reference, &config_data, &config.digest)
            .await?;

        let manifest = build_manifest(
            config,
            layers,
            options.annotations.clone(),
            options.artifact_type.clone(),
            options.subject.clone(),
        );

        // Serialize once so digest and size describe the exact pushed bytes.
        let bytes = serde_json::to_vec(&manifest)?;
        let size = bytes.len() as u64;
        let content_type = media_type::IMAGE_MANIFEST.to_string();
        let manifest_digest = self
            .transport
            .push_manifest_raw(reference, bytes, &content_type)
            .await?;

        tracing::info!(
            reference = %reference,
            digest = %manifest_digest,
            layers = files.len(),
            "Artifact pushed"
        );

        Ok(PushedManifest {
            digest: manifest_digest,
            size,
            media_type: content_type,
        })
    }

    /// Read, digest and push one file; build its layer descriptor.
    async fn push_file_layer(&self, reference: &str, file: &FileLayer) -> Result<Descriptor> {
        let data = std::fs::read(&file.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OrcaError::FileNotFound {
                    path: file.path.clone(),
                }
            } else {
                OrcaError::Io(e)
            }
        })?;

        let layer_digest = digest::sha256_digest(&data);
        self.transport
            .push_blob(reference, &data, &layer_digest)
            .await?;

        tracing::debug!(
            path = %file.path.display(),
            digest = %layer_digest,
            size = data.len(),
            "Layer blob pushed"
        );

        let mut annotations = file.annotations.clone().unwrap_or_default();
        match &file.title {
            // An explicit title wins over anything already in the map.
            Some(_) => {
                annotations.insert(
                    media_type::TITLE_ANNOTATION.to_string(),
                    file.effective_title(),
                );
            }
            None => {
                annotations
                    .entry(media_type::TITLE_ANNOTATION.to_string())
                    .or_insert_with(|| file.effective_title());
            }
        }

        Ok(Descriptor {
            media_type: file
                .media_type
                .clone()
                .unwrap_or_else(|| media_type::DEFAULT_LAYER.to_string()),
            digest: layer_digest,
            size: data.len() as u64,
            urls: None,
            annotations: Some(annotations),
        })
    }
}
