//! In-memory registry transport for integration tests.
//!
//! Stores blobs per (repository, digest) and manifests per canonical
//! reference, so cross-repository behavior (copy, mount) is observable.
//! Push counters let tests assert on idempotent-retry behavior.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use orca_client::manifest::{ImageIndex, ImageManifest, IndexEntry, ManifestKind};
use orca_client::reference::ImageReference;
use orca_client::transport::RegistryTransport;
use orca_core::error::{OrcaError, Result};
use orca_core::{digest, media_type};

#[derive(Default)]
struct Store {
    /// (repository, digest) -> blob bytes
    blobs: HashMap<(String, String), Vec<u8>>,
    /// canonical reference -> (manifest bytes, content type)
    manifests: HashMap<String, (Vec<u8>, String)>,
    /// Every blob push, in order (digest)
    blob_push_log: Vec<String>,
    /// Number of platform-aware pull_image_manifest calls
    image_manifest_pulls: usize,
}

/// In-memory transport; clones share the same store.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    store: Arc<Mutex<Store>>,
}

#[allow(dead_code)]
impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn repo_of(reference: &str) -> Result<String> {
        let r = ImageReference::parse(reference)?;
        Ok(format!("{}/{}", r.registry, r.repository))
    }

    fn canonical(reference: &str) -> Result<String> {
        Ok(ImageReference::parse(reference)?.full_reference())
    }

    fn not_found(reference: &str, what: &str) -> OrcaError {
        OrcaError::Transport {
            registry: ImageReference::parse(reference)
                .map(|r| r.registry)
                .unwrap_or_default(),
            message: format!("{} not found: {}", what, reference),
        }
    }

    fn lookup_manifest(&self, reference: &str) -> Result<(Vec<u8>, String)> {
        let key = Self::canonical(reference)?;
        self.store
            .lock()
            .unwrap()
            .manifests
            .get(&key)
            .cloned()
            .ok_or_else(|| Self::not_found(reference, "manifest"))
    }

    fn store_manifest(&self, reference: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let manifest_digest = digest::sha256_digest(&bytes);
        let by_ref = Self::canonical(reference)?;
        let by_digest = ImageReference::parse(reference)?
            .with_digest(&manifest_digest)
            .full_reference();

        let mut store = self.store.lock().unwrap();
        store
            .manifests
            .insert(by_ref, (bytes.clone(), content_type.to_string()));
        store
            .manifests
            .insert(by_digest, (bytes, content_type.to_string()));
        Ok(manifest_digest)
    }

    /// How many times a blob with this digest was pushed, to any repo.
    pub fn blob_push_count(&self, digest: &str) -> usize {
        self.store
            .lock()
            .unwrap()
            .blob_push_log
            .iter()
            .filter(|d| *d == digest)
            .count()
    }

    /// Whether a blob exists in the given repository.
    pub fn has_blob(&self, reference: &str, digest: &str) -> bool {
        let repo = Self::repo_of(reference).unwrap();
        self.store
            .lock()
            .unwrap()
            .blobs
            .contains_key(&(repo, digest.to_string()))
    }

    /// Whether any manifest is stored under the reference.
    pub fn has_manifest(&self, reference: &str) -> bool {
        self.lookup_manifest(reference).is_ok()
    }

    /// Number of delegated platform-aware pulls seen so far.
    pub fn image_manifest_pulls(&self) -> usize {
        self.store.lock().unwrap().image_manifest_pulls
    }
}

#[async_trait]
impl RegistryTransport for MemoryTransport {
    async fn pull_manifest_raw(
        &self,
        reference: &str,
        _accepted: &[&str],
    ) -> Result<(Vec<u8>, String)> {
        let (bytes, _content_type) = self.lookup_manifest(reference)?;
        let manifest_digest = digest::sha256_digest(&bytes);
        Ok((bytes, manifest_digest))
    }

    async fn pull_image_manifest(&self, reference: &str) -> Result<(ImageManifest, String)> {
        self.store.lock().unwrap().image_manifest_pulls += 1;

        let (bytes, _) = self.lookup_manifest(reference)?;
        match ManifestKind::from_slice(&bytes)? {
            ManifestKind::Manifest(manifest) => {
                Ok((manifest, digest::sha256_digest(&bytes)))
            }
            ManifestKind::Index(index) => {
                // Stand-in for the real transport's current-platform
                // resolution: take the first entry.
                let entry: &IndexEntry = index
                    .manifests
                    .first()
                    .ok_or_else(|| Self::not_found(reference, "index entry"))?;
                let pinned = ImageReference::parse(reference)?
                    .with_digest(&entry.digest)
                    .full_reference();
                let (entry_bytes, _) = self.lookup_manifest(&pinned)?;
                match ManifestKind::from_slice(&entry_bytes)? {
                    ManifestKind::Manifest(manifest) => Ok((manifest, entry.digest.clone())),
                    ManifestKind::Index(_) => Err(OrcaError::ManifestParse(
                        "nested index".to_string(),
                    )),
                }
            }
        }
    }

    async fn push_manifest_raw(
        &self,
        reference: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        self.store_manifest(reference, bytes, content_type)
    }

    async fn fetch_manifest_digest(&self, reference: &str) -> Result<String> {
        let (bytes, _) = self.lookup_manifest(reference)?;
        Ok(digest::sha256_digest(&bytes))
    }

    async fn pull_blob(&self, reference: &str, digest: &str) -> Result<Vec<u8>> {
        let repo = Self::repo_of(reference)?;
        self.store
            .lock()
            .unwrap()
            .blobs
            .get(&(repo, digest.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found(reference, "blob"))
    }

    async fn push_blob(&self, reference: &str, data: &[u8], digest: &str) -> Result<String> {
        let repo = Self::repo_of(reference)?;
        let mut store = self.store.lock().unwrap();
        store.blob_push_log.push(digest.to_string());
        store.blobs.insert((repo, digest.to_string()), data.to_vec());
        Ok(digest.to_string())
    }

    async fn mount_blob(&self, target: &str, from: &str, digest: &str) -> Result<String> {
        let from_repo = Self::repo_of(from)?;
        let target_repo = Self::repo_of(target)?;

        let mut store = self.store.lock().unwrap();
        let data = store
            .blobs
            .get(&(from_repo, digest.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found(from, "blob"))?;
        store.blobs.insert((target_repo, digest.to_string()), data);
        Ok(digest.to_string())
    }

    async fn list_tags(
        &self,
        reference: &str,
        n: Option<usize>,
        last: Option<&str>,
    ) -> Result<Vec<String>> {
        let repo = Self::repo_of(reference)?;
        let prefix = format!("{}:", repo);

        let store = self.store.lock().unwrap();
        let mut tags: Vec<String> = store
            .manifests
            .keys()
            .filter(|key| !key.contains('@'))
            .filter_map(|key| key.strip_prefix(&prefix))
            .map(|tag| tag.to_string())
            .collect();
        tags.sort();

        if let Some(last) = last {
            tags.retain(|t| t.as_str() > last);
        }
        if let Some(n) = n {
            tags.truncate(n);
        }
        Ok(tags)
    }

    async fn pull_referrers(
        &self,
        reference: &str,
        artifact_type: Option<&str>,
    ) -> Result<ImageIndex> {
        let (subject_bytes, _) = self.lookup_manifest(reference)?;
        let subject_digest = digest::sha256_digest(&subject_bytes);

        let store = self.store.lock().unwrap();
        let mut seen = Vec::new();
        let mut entries = Vec::new();
        for (bytes, content_type) in store.manifests.values() {
            let Ok(ManifestKind::Manifest(manifest)) = ManifestKind::from_slice(bytes) else {
                continue;
            };
            let refers = manifest
                .subject
                .as_ref()
                .map(|s| s.digest == subject_digest)
                .unwrap_or(false);
            let type_matches = match artifact_type {
                Some(t) => manifest.artifact_type.as_deref() == Some(t),
                None => true,
            };
            let referrer_digest = digest::sha256_digest(bytes);
            if refers && type_matches && !seen.contains(&referrer_digest) {
                seen.push(referrer_digest.clone());
                entries.push(IndexEntry {
                    media_type: content_type.clone(),
                    digest: referrer_digest,
                    size: bytes.len() as u64,
                    platform: None,
                    annotations: manifest.annotations.clone(),
                });
            }
        }

        Ok(ImageIndex {
            schema_version: 2,
            media_type: Some(media_type::IMAGE_INDEX.to_string()),
            artifact_type: None,
            manifests: entries,
            subject: None,
            annotations: None,
        })
    }
}
