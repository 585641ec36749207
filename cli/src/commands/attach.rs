//! `orca attach` command — attach files to an existing manifest as a
//! referring artifact.

use std::path::PathBuf;

use clap::Args;
use orca_client::{
    ArtifactAssembler, AssembleOptions, Descriptor, DistributionTransport, FileLayer,
    ManifestKind, RegistryTransport,
};
use orca_core::media_type;

#[derive(Args)]
pub struct AttachArgs {
    /// Subject reference the new artifact refers to
    pub subject: String,

    /// Files to push as the attached artifact's layers
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Reference to push the attached artifact to
    #[arg(long)]
    pub artifact_ref: String,

    /// Artifact type of the attachment
    #[arg(long)]
    pub artifact_type: String,

    /// Manifest annotation (key=value, repeatable)
    #[arg(long = "annotation", value_parser = super::parse_key_val)]
    pub annotations: Vec<(String, String)>,
}

pub async fn execute(
    args: AttachArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    // The subject descriptor points at the exact manifest bytes stored
    // under the subject reference.
    let (subject_bytes, subject_digest) = transport
        .pull_manifest_raw(&args.subject, media_type::MANIFEST_ACCEPT_TYPES)
        .await?;
    let subject_kind = ManifestKind::from_slice(&subject_bytes)?;

    let subject = Descriptor {
        media_type: subject_kind.content_type().to_string(),
        digest: subject_digest,
        size: subject_bytes.len() as u64,
        urls: None,
        annotations: None,
    };

    let files: Vec<FileLayer> = args.files.iter().map(FileLayer::new).collect();
    let options = AssembleOptions {
        artifact_type: Some(args.artifact_type),
        annotations: super::annotation_map(args.annotations),
        config_media_type: None,
        subject: Some(subject),
    };

    let assembler = ArtifactAssembler::new(&transport);
    let digest = assembler
        .assemble(&args.artifact_ref, &files, &options)
        .await?;

    println!("Attached: {} -> {} ({})", args.artifact_ref, args.subject, digest);
    Ok(())
}
