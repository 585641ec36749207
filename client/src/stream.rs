//! Layer streaming: resolved manifests down to consumable byte streams.
//!
//! Layer payloads are materialized fully in memory by the transport and
//! exposed as [`LayerStream`] values with `io::Read` adapters on top.
//! Gzip-compressed tar layers can be inflated transparently; unpacking a
//! tar stream into a directory goes through the [`Unpacker`] capability,
//! which may be absent (a configuration error, not a data error).

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use orca_core::error::{OrcaError, Result};
use orca_core::{digest, media_type};

use crate::manifest::ImageManifest;
use crate::transport::RegistryTransport;

/// One resolved layer: its bytes plus the descriptor facts needed to
/// interpret them.
#[derive(Debug, Clone)]
pub struct LayerStream {
    /// Layer payload, fully materialized
    pub data: Vec<u8>,
    /// Media type from the layer descriptor
    pub media_type: String,
    /// Content digest from the layer descriptor
    pub digest: String,
    /// Annotations from the layer descriptor
    pub annotations: Option<BTreeMap<String, String>>,
    /// File name derived from the title annotation, when present
    pub filename: Option<String>,
}

impl LayerStream {
    /// A reader over the raw layer bytes.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.data)
    }

    /// A reader over the layer bytes, gzip-inflated when the media type
    /// says the layer is a compressed tar.
    pub fn decompressed_reader(&self) -> Box<dyn Read + Send + '_> {
        if is_tar_gz(&self.media_type) {
            Box::new(GzDecoder::new(self.reader()))
        } else {
            Box::new(self.reader())
        }
    }

    /// The name to materialize this layer under: the title annotation,
    /// else the digest hex.
    pub fn target_filename(&self) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| digest::digest_hex(&self.digest).to_string())
    }
}

/// Whether a media type denotes a gzip-compressed tar layer.
pub fn is_tar_gz(media_type: &str) -> bool {
    media_type.contains("tar+gzip") || media_type == media_type::DOCKER_LAYER_TAR_GZIP
}

/// Whether a media type denotes an uncompressed tar layer.
pub fn is_tar(media_type: &str) -> bool {
    media_type == media_type::OCI_LAYER_TAR || media_type == media_type::DOCKER_LAYER_TAR
}

/// Tar-unpacking capability.
///
/// Injected into the streamer so environments without tar support can
/// drop it and get a distinct error instead of a generic failure.
pub trait Unpacker: Send + Sync {
    /// Unpack a tar stream into `dest`, calling `on_entry` with each
    /// entry's relative path as it is written.
    fn unpack(
        &self,
        reader: &mut dyn Read,
        dest: &Path,
        on_entry: &mut dyn FnMut(&Path),
    ) -> Result<()>;
}

/// Default unpacker backed by the `tar` crate.
pub struct TarUnpacker;

impl Unpacker for TarUnpacker {
    fn unpack(
        &self,
        reader: &mut dyn Read,
        dest: &Path,
        on_entry: &mut dyn FnMut(&Path),
    ) -> Result<()> {
        std::fs::create_dir_all(dest)?;

        let mut archive = tar::Archive::new(reader);
        for entry in archive.entries()? {
            let mut entry = entry?;
            let path = entry.path()?.to_path_buf();
            entry.unpack_in(dest)?;
            on_entry(&path);
        }
        Ok(())
    }
}

/// Exposes resolved layer bytes as consumable streams.
pub struct LayerStreamer<T> {
    transport: T,
    unpacker: Option<Box<dyn Unpacker>>,
}

impl<T> LayerStreamer<T> {
    /// A streamer with the default tar unpacker.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            unpacker: Some(Box::new(TarUnpacker)),
        }
    }

    /// A streamer without tar support; extraction reports
    /// [`OrcaError::MissingExtractionDependency`].
    pub fn without_unpacker(transport: T) -> Self {
        Self {
            transport,
            unpacker: None,
        }
    }

    /// Decompress (when needed) and unpack a tar layer into `dest`,
    /// invoking `on_entry` per extracted entry.
    pub fn extract(
        &self,
        layer: &LayerStream,
        dest: &Path,
        mut on_entry: impl FnMut(&Path),
    ) -> Result<()> {
        let unpacker = self
            .unpacker
            .as_deref()
            .ok_or(OrcaError::MissingExtractionDependency)?;

        let mut reader = layer.decompressed_reader();
        unpacker.unpack(&mut reader, dest, &mut on_entry)
    }

    /// Write each layer to `dest/<filename>`; the plain-artifact pull
    /// path. Returns the written paths in layer order.
    pub fn materialize(&self, layers: &[LayerStream], dest: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dest)?;

        let mut written = Vec::with_capacity(layers.len());
        for layer in layers {
            let path = dest.join(layer.target_filename());
            std::fs::write(&path, &layer.data)?;
            written.push(path);
        }
        Ok(written)
    }
}

impl<T: RegistryTransport> LayerStreamer<T> {
    /// Pull every layer of a resolved manifest, in manifest order.
    pub async fn fetch_layers(
        &self,
        reference: &str,
        manifest: &ImageManifest,
    ) -> Result<Vec<LayerStream>> {
        let mut streams = Vec::with_capacity(manifest.layers.len());

        for layer in &manifest.layers {
            tracing::debug!(
                digest = %layer.digest,
                size = layer.size,
                "Pulling layer"
            );
            let data = self.transport.pull_blob(reference, &layer.digest).await?;
            let filename = layer
                .annotations
                .as_ref()
                .and_then(|a| a.get(media_type::TITLE_ANNOTATION))
                .cloned();

            streams.push(LayerStream {
                data,
                media_type: layer.media_type.clone(),
                digest: layer.digest.clone(),
                annotations: layer.annotations.clone(),
                filename,
            });
        }

        Ok(streams)
    }
}
