//! `orca tags` command.

use clap::Args;
use orca_client::{DistributionTransport, RegistryTransport};

#[derive(Args)]
pub struct TagsArgs {
    /// Repository reference to list tags for
    pub reference: String,

    /// Maximum number of tags to return
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Last tag from a previous listing, for pagination
    #[arg(long)]
    pub last: Option<String>,
}

pub async fn execute(
    args: TagsArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    let tags = transport
        .list_tags(&args.reference, args.limit, args.last.as_deref())
        .await?;

    for tag in tags {
        println!("{tag}");
    }
    Ok(())
}
