//! `orca push` command.

use std::path::PathBuf;

use clap::Args;
use orca_client::{ArtifactAssembler, AssembleOptions, DistributionTransport, FileLayer};

#[derive(Args)]
pub struct PushArgs {
    /// Target reference (e.g. "localhost:5000/artifacts/demo:v1")
    pub reference: String,

    /// Files to push as layers, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Artifact type recorded in the manifest
    #[arg(long)]
    pub artifact_type: Option<String>,

    /// Media type applied to every file layer (default: octet-stream)
    #[arg(long)]
    pub media_type: Option<String>,

    /// Media type for the synthesized config blob
    #[arg(long)]
    pub config_media_type: Option<String>,

    /// Manifest annotation (key=value, repeatable)
    #[arg(long = "annotation", value_parser = super::parse_key_val)]
    pub annotations: Vec<(String, String)>,
}

pub async fn execute(
    args: PushArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    let files: Vec<FileLayer> = args
        .files
        .iter()
        .map(|path| {
            let mut layer = FileLayer::new(path);
            layer.media_type = args.media_type.clone();
            layer
        })
        .collect();

    let options = AssembleOptions {
        artifact_type: args.artifact_type,
        annotations: super::annotation_map(args.annotations),
        config_media_type: args.config_media_type,
        subject: None,
    };

    let assembler = ArtifactAssembler::new(transport);
    let digest = assembler.assemble(&args.reference, &files, &options).await?;

    println!("Pushed: {} ({})", args.reference, digest);
    Ok(())
}
