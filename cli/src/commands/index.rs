//! `orca manifest-index` commands — create and inspect multi-platform
//! indexes.

use clap::{Args, Subcommand};
use comfy_table::Table;
use orca_client::{
    build_index, list_platforms, Descriptor, DistributionTransport, ManifestKind, Platform,
    RegistryTransport,
};
use orca_core::media_type;

#[derive(Subcommand)]
pub enum IndexCommand {
    /// Create an index referencing existing manifests
    Create(IndexCreateArgs),
    /// List the entries and platforms of an index
    List(IndexListArgs),
}

#[derive(Args)]
pub struct IndexCreateArgs {
    /// Reference to push the index to
    pub reference: String,

    /// References of the member manifests, in order
    #[arg(required = true)]
    pub members: Vec<String>,

    /// Platform of each member (os/arch[/variant]), one per member
    #[arg(long = "platform", required = true)]
    pub platforms: Vec<String>,

    /// Index annotation (key=value, repeatable)
    #[arg(long = "annotation", value_parser = super::parse_key_val)]
    pub annotations: Vec<(String, String)>,
}

#[derive(Args)]
pub struct IndexListArgs {
    /// Reference of the index to inspect
    pub reference: String,
}

pub async fn execute(
    command: IndexCommand,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        IndexCommand::Create(args) => create(args, transport).await,
        IndexCommand::List(args) => list(args, transport).await,
    }
}

async fn create(
    args: IndexCreateArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.platforms.len() != args.members.len() {
        return Err(format!(
            "expected one --platform per member ({} members, {} platforms)",
            args.members.len(),
            args.platforms.len()
        )
        .into());
    }

    let mut entries = Vec::with_capacity(args.members.len());
    for (member, platform_spec) in args.members.iter().zip(&args.platforms) {
        let platform = Platform::parse(platform_spec)?;
        let (bytes, member_digest) = transport
            .pull_manifest_raw(member, media_type::MANIFEST_ACCEPT_TYPES)
            .await?;
        let kind = ManifestKind::from_slice(&bytes)?;

        let descriptor = Descriptor {
            media_type: kind.content_type().to_string(),
            digest: member_digest,
            size: bytes.len() as u64,
            urls: None,
            annotations: None,
        };
        entries.push((descriptor, platform));
    }

    let index = build_index(entries, super::annotation_map(args.annotations));
    let digest = transport.push_index(&args.reference, &index).await?;

    println!("Created index: {} ({})", args.reference, digest);
    Ok(())
}

async fn list(
    args: IndexListArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    let (bytes, _) = transport
        .pull_manifest_raw(&args.reference, media_type::MANIFEST_ACCEPT_TYPES)
        .await?;
    let index = match ManifestKind::from_slice(&bytes)? {
        ManifestKind::Index(index) => index,
        ManifestKind::Manifest(_) => {
            return Err(format!("'{}' is not an image index", args.reference).into());
        }
    };

    let mut table = Table::new();
    table.set_header(vec!["DIGEST", "PLATFORM"]);
    for (digest, platform) in list_platforms(&index) {
        let platform = platform
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![digest, platform]);
    }

    println!("{table}");
    Ok(())
}
