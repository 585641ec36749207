//! `orca referrers` command — list artifacts referring to a subject.

use clap::Args;
use orca_client::{DistributionTransport, RegistryTransport};

#[derive(Args)]
pub struct ReferrersArgs {
    /// Subject reference
    pub reference: String,

    /// Only list referrers of this artifact type
    #[arg(long)]
    pub artifact_type: Option<String>,
}

pub async fn execute(
    args: ReferrersArgs,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    let referrers = transport
        .pull_referrers(&args.reference, args.artifact_type.as_deref())
        .await?;

    println!("{}", serde_json::to_string_pretty(&referrers)?);
    Ok(())
}
