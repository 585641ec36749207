//! `orca manifest` command.

use clap::Args;
use orca_client::{ArtifactResolver, DistributionTransport};

#[derive(Args)]
pub struct ManifestArgs {
    /// Reference whose manifest to print
    pub reference: String,
}

pub async fn execute(
    args: ManifestArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = ArtifactResolver::new(transport);
    let (kind, _, digest) = resolver.pull_kind(&args.reference).await?;

    tracing::debug!(reference = %args.reference, digest = %digest, "Manifest pulled");
    println!("{}", serde_json::to_string_pretty(&kind)?);
    Ok(())
}
