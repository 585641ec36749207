//! Fixed OCI and Docker media type strings.

/// OCI image manifest media type.
pub const IMAGE_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

/// OCI image index media type.
pub const IMAGE_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// Docker schema 2 manifest media type.
pub const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Docker schema 2 manifest list media type.
pub const DOCKER_MANIFEST_LIST: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";

/// Default media type for file layers pushed without an explicit type.
pub const DEFAULT_LAYER: &str = "application/octet-stream";

/// Default media type for the synthesized empty-JSON config blob.
pub const DEFAULT_CONFIG: &str = "application/vnd.unknown.config.v1+json";

/// Annotation key carrying the original file name of a layer.
pub const TITLE_ANNOTATION: &str = "org.opencontainers.image.title";

/// OCI uncompressed tar layer.
pub const OCI_LAYER_TAR: &str = "application/vnd.oci.image.layer.v1.tar";

/// OCI gzip-compressed tar layer.
pub const OCI_LAYER_TAR_GZIP: &str = "application/vnd.oci.image.layer.v1.tar+gzip";

/// Docker uncompressed tar layer.
pub const DOCKER_LAYER_TAR: &str = "application/vnd.docker.image.rootfs.diff.tar";

/// Docker gzip-compressed tar layer.
pub const DOCKER_LAYER_TAR_GZIP: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";

/// Manifest media types accepted when pulling a reference that may be
/// either a concrete manifest or a multi-platform index.
pub const MANIFEST_ACCEPT_TYPES: &[&str] = &[
    IMAGE_MANIFEST,
    IMAGE_INDEX,
    DOCKER_MANIFEST,
    DOCKER_MANIFEST_LIST,
];
