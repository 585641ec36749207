//! Registry transport: the wire seam between the artifact engine and an
//! OCI distribution registry.
//!
//! The engine never talks HTTP itself. Everything network-shaped goes
//! through the [`RegistryTransport`] trait, injected into the assembler,
//! resolver and streamer constructors; [`DistributionTransport`] is the
//! production implementation over `oci_client::Client`. Authentication
//! handshakes, retries and chunked upload negotiation are that crate's
//! concern and are surfaced here as opaque [`OrcaError::Transport`]
//! failures.

use std::str::FromStr;

use async_trait::async_trait;
use oci_client::client::{ClientConfig, ClientProtocol};
use oci_client::secrets::RegistryAuth as OciRegistryAuth;
use oci_client::{Client, Reference};
use orca_core::error::{OrcaError, Result};
use orca_core::{digest, media_type};

use crate::manifest::{ImageIndex, ImageManifest};

/// Authentication credentials for a registry.
#[derive(Debug, Clone, Default)]
pub struct RegistryAuth {
    username: Option<String>,
    password: Option<String>,
}

impl RegistryAuth {
    /// Anonymous access (no credentials).
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Basic authentication with username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Read credentials from `ORAS_USERNAME` / `ORAS_PASSWORD`.
    ///
    /// Falls back to anonymous when either is unset.
    pub fn from_env() -> Self {
        let username = std::env::var("ORAS_USERNAME").ok();
        let password = std::env::var("ORAS_PASSWORD").ok();

        if username.is_some() && password.is_some() {
            Self { username, password }
        } else {
            Self::anonymous()
        }
    }

    fn to_oci_auth(&self) -> OciRegistryAuth {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => OciRegistryAuth::Basic(u.clone(), p.clone()),
            _ => OciRegistryAuth::Anonymous,
        }
    }
}

/// Capability set consumed by the artifact engine.
///
/// Implementations are stateless across calls aside from whatever
/// connection/auth caching the underlying client keeps; the insecure/TLS
/// mode is fixed at construction.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Pull raw manifest bytes and the manifest digest.
    async fn pull_manifest_raw(
        &self,
        reference: &str,
        accepted: &[&str],
    ) -> Result<(Vec<u8>, String)>;

    /// Pull a concrete image manifest, resolving a multi-platform index
    /// to the current platform on the transport side.
    async fn pull_image_manifest(&self, reference: &str) -> Result<(ImageManifest, String)>;

    /// Push raw manifest bytes under the given content type. Returns the
    /// content digest of the pushed bytes.
    async fn push_manifest_raw(
        &self,
        reference: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    /// Serialize and push an image manifest. Returns its digest.
    async fn push_manifest(&self, reference: &str, manifest: &ImageManifest) -> Result<String> {
        let bytes = serde_json::to_vec(manifest)?;
        let content_type = manifest
            .media_type
            .clone()
            .unwrap_or_else(|| media_type::IMAGE_MANIFEST.to_string());
        self.push_manifest_raw(reference, bytes, &content_type).await
    }

    /// Serialize and push an image index. Returns its digest.
    async fn push_index(&self, reference: &str, index: &ImageIndex) -> Result<String> {
        let bytes = serde_json::to_vec(index)?;
        let content_type = index
            .media_type
            .clone()
            .unwrap_or_else(|| media_type::IMAGE_INDEX.to_string());
        self.push_manifest_raw(reference, bytes, &content_type).await
    }

    /// Fetch the manifest digest without pulling the manifest body.
    async fn fetch_manifest_digest(&self, reference: &str) -> Result<String>;

    /// Pull a blob by digest.
    async fn pull_blob(&self, reference: &str, digest: &str) -> Result<Vec<u8>>;

    /// Push a blob under a pre-computed digest. Returns the digest.
    async fn push_blob(&self, reference: &str, data: &[u8], digest: &str) -> Result<String>;

    /// Cross-repository blob mount. Returns the mounted digest.
    async fn mount_blob(&self, target: &str, from: &str, digest: &str) -> Result<String>;

    /// List repository tags, optionally paginated.
    async fn list_tags(
        &self,
        reference: &str,
        n: Option<usize>,
        last: Option<&str>,
    ) -> Result<Vec<String>>;

    /// Pull the OCI 1.1 referrers index, optionally filtered by artifact
    /// type.
    async fn pull_referrers(
        &self,
        reference: &str,
        artifact_type: Option<&str>,
    ) -> Result<ImageIndex>;
}

// Forwarding impl so callers can hand the same transport to several
// components by reference.
#[async_trait]
impl<T: RegistryTransport + ?Sized> RegistryTransport for &T {
    async fn pull_manifest_raw(
        &self,
        reference: &str,
        accepted: &[&str],
    ) -> Result<(Vec<u8>, String)> {
        (**self).pull_manifest_raw(reference, accepted).await
    }

    async fn pull_image_manifest(&self, reference: &str) -> Result<(ImageManifest, String)> {
        (**self).pull_image_manifest(reference).await
    }

    async fn push_manifest_raw(
        &self,
        reference: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        (**self).push_manifest_raw(reference, bytes, content_type).await
    }

    async fn push_manifest(&self, reference: &str, manifest: &ImageManifest) -> Result<String> {
        (**self).push_manifest(reference, manifest).await
    }

    async fn push_index(&self, reference: &str, index: &ImageIndex) -> Result<String> {
        (**self).push_index(reference, index).await
    }

    async fn fetch_manifest_digest(&self, reference: &str) -> Result<String> {
        (**self).fetch_manifest_digest(reference).await
    }

    async fn pull_blob(&self, reference: &str, digest: &str) -> Result<Vec<u8>> {
        (**self).pull_blob(reference, digest).await
    }

    async fn push_blob(&self, reference: &str, data: &[u8], digest: &str) -> Result<String> {
        (**self).push_blob(reference, data, digest).await
    }

    async fn mount_blob(&self, target: &str, from: &str, digest: &str) -> Result<String> {
        (**self).mount_blob(target, from, digest).await
    }

    async fn list_tags(
        &self,
        reference: &str,
        n: Option<usize>,
        last: Option<&str>,
    ) -> Result<Vec<String>> {
        (**self).list_tags(reference, n, last).await
    }

    async fn pull_referrers(
        &self,
        reference: &str,
        artifact_type: Option<&str>,
    ) -> Result<ImageIndex> {
        (**self).pull_referrers(reference, artifact_type).await
    }
}

/// Production transport over `oci_client::Client`.
pub struct DistributionTransport {
    client: Client,
    auth: RegistryAuth,
}

impl DistributionTransport {
    /// Create a transport. `insecure` switches the client to plain HTTP.
    pub fn new(insecure: bool, auth: RegistryAuth) -> Self {
        let config = ClientConfig {
            protocol: if insecure {
                ClientProtocol::Http
            } else {
                ClientProtocol::Https
            },
            ..Default::default()
        };
        Self {
            client: Client::new(config),
            auth,
        }
    }

    fn parse_reference(reference: &str) -> Result<Reference> {
        Reference::from_str(reference)
            .map_err(|e| OrcaError::InvalidReference(format!("{}: {}", reference, e)))
    }

    fn transport_error(reference: &Reference, err: impl std::fmt::Display) -> OrcaError {
        OrcaError::Transport {
            registry: reference.resolve_registry().to_string(),
            message: err.to_string(),
        }
    }

    /// Seed the client's per-registry auth cache before operations whose
    /// underlying calls take no auth parameter.
    async fn store_auth(&self, reference: &Reference) {
        self.client
            .store_auth_if_needed(reference.resolve_registry(), &self.auth.to_oci_auth())
            .await;
    }
}

#[async_trait]
impl RegistryTransport for DistributionTransport {
    async fn pull_manifest_raw(
        &self,
        reference: &str,
        accepted: &[&str],
    ) -> Result<(Vec<u8>, String)> {
        let r = Self::parse_reference(reference)?;
        let auth = self.auth.to_oci_auth();

        self.client
            .pull_manifest_raw(&r, &auth, accepted)
            .await
            .map_err(|e| Self::transport_error(&r, e))
    }

    async fn pull_image_manifest(&self, reference: &str) -> Result<(ImageManifest, String)> {
        let r = Self::parse_reference(reference)?;
        let auth = self.auth.to_oci_auth();

        let (manifest, digest) = self
            .client
            .pull_image_manifest(&r, &auth)
            .await
            .map_err(|e| Self::transport_error(&r, e))?;

        // Re-read through our own data model; the wire JSON is identical.
        let value = serde_json::to_value(&manifest)?;
        let manifest: ImageManifest = serde_json::from_value(value)
            .map_err(|e| OrcaError::ManifestParse(e.to_string()))?;
        Ok((manifest, digest))
    }

    async fn push_manifest_raw(
        &self,
        reference: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let r = Self::parse_reference(reference)?;
        self.store_auth(&r).await;

        let manifest_digest = digest::sha256_digest(&bytes);
        let content_type = content_type.parse().map_err(|e| OrcaError::Transport {
            registry: r.resolve_registry().to_string(),
            message: format!("invalid manifest content type: {}", e),
        })?;

        self.client
            .push_manifest_raw(&r, bytes, content_type)
            .await
            .map_err(|e| Self::transport_error(&r, e))?;

        Ok(manifest_digest)
    }

    async fn fetch_manifest_digest(&self, reference: &str) -> Result<String> {
        let r = Self::parse_reference(reference)?;
        let auth = self.auth.to_oci_auth();

        self.client
            .fetch_manifest_digest(&r, &auth)
            .await
            .map_err(|e| Self::transport_error(&r, e))
    }

    async fn pull_blob(&self, reference: &str, digest: &str) -> Result<Vec<u8>> {
        let r = Self::parse_reference(reference)?;
        self.store_auth(&r).await;

        let mut content = Vec::new();
        self.client
            .pull_blob(&r, digest, &mut content)
            .await
            .map_err(|e| Self::transport_error(&r, e))?;

        Ok(content)
    }

    async fn push_blob(&self, reference: &str, data: &[u8], digest: &str) -> Result<String> {
        let r = Self::parse_reference(reference)?;
        self.store_auth(&r).await;

        self.client
            .push_blob(&r, data, digest)
            .await
            .map_err(|e| Self::transport_error(&r, e))?;

        Ok(digest.to_string())
    }

    async fn mount_blob(&self, target: &str, from: &str, digest: &str) -> Result<String> {
        let target_ref = Self::parse_reference(target)?;
        let from_ref = Self::parse_reference(from)?;
        self.store_auth(&target_ref).await;

        self.client
            .mount_blob(&target_ref, &from_ref, digest)
            .await
            .map_err(|e| Self::transport_error(&target_ref, e))?;

        Ok(digest.to_string())
    }

    async fn list_tags(
        &self,
        reference: &str,
        n: Option<usize>,
        last: Option<&str>,
    ) -> Result<Vec<String>> {
        let r = Self::parse_reference(reference)?;
        let auth = self.auth.to_oci_auth();

        let response = self
            .client
            .list_tags(&r, &auth, n, last)
            .await
            .map_err(|e| Self::transport_error(&r, e))?;

        Ok(response.tags)
    }

    async fn pull_referrers(
        &self,
        reference: &str,
        artifact_type: Option<&str>,
    ) -> Result<ImageIndex> {
        let r = Self::parse_reference(reference)?;
        self.store_auth(&r).await;

        let referrers = self
            .client
            .pull_referrers(&r, artifact_type)
            .await
            .map_err(|e| Self::transport_error(&r, e))?;

        let value = serde_json::to_value(&referrers)?;
        serde_json::from_value(value).map_err(|e| OrcaError::ManifestParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_auth_anonymous() {
        let auth = RegistryAuth::anonymous();
        assert!(matches!(auth.to_oci_auth(), OciRegistryAuth::Anonymous));
    }

    #[test]
    fn test_registry_auth_basic() {
        let auth = RegistryAuth::basic("user", "pass");
        assert!(matches!(auth.to_oci_auth(), OciRegistryAuth::Basic(_, _)));
    }

    #[test]
    fn test_parse_reference_invalid() {
        let result = DistributionTransport::parse_reference("");
        assert!(matches!(result, Err(OrcaError::InvalidReference(_))));
    }

    #[test]
    fn test_parse_reference_valid() {
        let r = DistributionTransport::parse_reference("ghcr.io/org/artifact:v1").unwrap();
        assert_eq!(r.to_string(), "ghcr.io/org/artifact:v1");
    }
}
