//! `orca pull-platform` command — pull for an explicit target platform.

use std::path::PathBuf;

use clap::Args;
use orca_client::{ArtifactResolver, DistributionTransport, LayerStreamer, Platform};

#[derive(Args)]
pub struct PullPlatformArgs {
    /// Reference to pull
    pub reference: String,

    /// Target platform (os/arch[/variant])
    #[arg(long)]
    pub platform: String,

    /// Directory to materialize layers into
    #[arg(short = 'o', long, default_value = ".")]
    pub output: PathBuf,
}

pub async fn execute(
    args: PullPlatformArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    let platform = Platform::parse(&args.platform)?;

    let resolver = ArtifactResolver::new(&transport);
    let manifest = resolver.resolve_platform(&args.reference, &platform).await?;

    let streamer = LayerStreamer::new(&transport);
    let layers = streamer.fetch_layers(&args.reference, &manifest).await?;
    let written = streamer.materialize(&layers, &args.output)?;

    for path in &written {
        println!("{}", path.display());
    }
    println!(
        "Pulled: {} for {} ({} layers)",
        args.reference,
        platform,
        written.len()
    );
    Ok(())
}
