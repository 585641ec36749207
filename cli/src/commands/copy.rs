//! `orca copy` command — copy an artifact between references.

use clap::Args;
use orca_client::{copy_artifact, DistributionTransport};

#[derive(Args)]
pub struct CopyArgs {
    /// Source reference
    pub src: String,

    /// Destination reference
    pub dst: String,
}

pub async fn execute(
    args: CopyArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    let digest = copy_artifact(&transport, &args.src, &args.dst).await?;

    println!("Copied: {} -> {} ({})", args.src, args.dst, digest);
    Ok(())
}
