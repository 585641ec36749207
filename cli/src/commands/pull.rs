//! `orca pull` command.

use std::path::PathBuf;

use clap::Args;
use orca_client::{ArtifactResolver, DistributionTransport, LayerStreamer};

#[derive(Args)]
pub struct PullArgs {
    /// Reference to pull
    pub reference: String,

    /// Directory to materialize layers into
    #[arg(short = 'o', long, default_value = ".")]
    pub output: PathBuf,
}

pub async fn execute(
    args: PullArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = ArtifactResolver::new(&transport);
    let manifest = resolver.resolve(&args.reference).await?;

    let streamer = LayerStreamer::new(&transport);
    let layers = streamer.fetch_layers(&args.reference, &manifest).await?;
    let written = streamer.materialize(&layers, &args.output)?;

    for path in &written {
        println!("{}", path.display());
    }
    println!("Pulled: {} ({} layers)", args.reference, written.len());
    Ok(())
}
