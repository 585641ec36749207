//! `orca push-multiplatform` command — one artifact per platform plus an
//! index tying them together.

use std::path::PathBuf;

use clap::Args;
use orca_client::{
    build_index, ArtifactAssembler, AssembleOptions, Descriptor, DistributionTransport,
    FileLayer, Platform, RegistryTransport,
};

#[derive(Args)]
pub struct PushMultiplatformArgs {
    /// Target reference; ends up naming the index
    pub reference: String,

    /// Platform and its files: "os/arch[/variant]:file1,file2" (repeatable)
    #[arg(long = "platform", required = true)]
    pub platforms: Vec<String>,

    /// Index annotation (key=value, repeatable)
    #[arg(long = "annotation", value_parser = super::parse_key_val)]
    pub annotations: Vec<(String, String)>,
}

/// One `--platform` argument, split into its platform and file list.
fn parse_platform_arg(arg: &str) -> Result<(Platform, Vec<PathBuf>), Box<dyn std::error::Error>> {
    let (spec, files) = arg
        .split_once(':')
        .ok_or_else(|| format!("invalid --platform '{}', expected os/arch:file1,file2", arg))?;

    let platform = Platform::parse(spec)?;
    let files: Vec<PathBuf> = files
        .split(',')
        .filter(|f| !f.is_empty())
        .map(PathBuf::from)
        .collect();
    if files.is_empty() {
        return Err(format!("no files listed for platform '{}'", spec).into());
    }
    Ok((platform, files))
}

pub async fn execute(
    args: PushMultiplatformArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    let assembler = ArtifactAssembler::new(&transport);
    let options = AssembleOptions::default();

    // Push each platform's artifact. The tag is re-pointed with every
    // manifest push; only the final index keeps it. The per-platform
    // manifests stay addressable by digest, which is what the index
    // entries record.
    let mut entries = Vec::with_capacity(args.platforms.len());
    for platform_arg in &args.platforms {
        let (platform, paths) = parse_platform_arg(platform_arg)?;
        let files: Vec<FileLayer> = paths.iter().map(FileLayer::new).collect();

        let pushed = assembler
            .assemble_detailed(&args.reference, &files, &options)
            .await?;
        println!("Pushed {}: {}", platform, pushed.digest);

        let descriptor = Descriptor {
            media_type: pushed.media_type,
            digest: pushed.digest,
            size: pushed.size,
            urls: None,
            annotations: None,
        };
        entries.push((descriptor, platform));
    }

    let index = build_index(entries, super::annotation_map(args.annotations));
    let digest = transport.push_index(&args.reference, &index).await?;

    println!("Pushed index: {} ({})", args.reference, digest);
    Ok(())
}
