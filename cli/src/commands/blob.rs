//! `orca blob` commands — push or fetch a single blob by digest.

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use orca_client::{DistributionTransport, RegistryTransport};
use orca_core::digest;

#[derive(Subcommand)]
pub enum BlobCommand {
    /// Push a file as a blob; prints its digest
    Push(BlobPushArgs),
    /// Fetch a blob by digest
    Fetch(BlobFetchArgs),
}

#[derive(Args)]
pub struct BlobPushArgs {
    /// Repository reference to push into
    pub reference: String,

    /// File to push
    pub file: PathBuf,
}

#[derive(Args)]
pub struct BlobFetchArgs {
    /// Repository reference to fetch from
    pub reference: String,

    /// Digest of the blob (sha256:...)
    pub digest: String,

    /// Write to a file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

pub async fn execute(
    command: BlobCommand,
    transport: DistributionTransport,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        BlobCommand::Push(args) => {
            let data = std::fs::read(&args.file)?;
            let blob_digest = digest::sha256_digest(&data);
            transport
                .push_blob(&args.reference, &data, &blob_digest)
                .await?;
            println!("{}", blob_digest);
            Ok(())
        }
        BlobCommand::Fetch(args) => {
            let data = transport.pull_blob(&args.reference, &args.digest).await?;
            match args.output {
                Some(path) => {
                    std::fs::write(&path, &data)?;
                    println!("{}", path.display());
                }
                None => std::io::stdout().write_all(&data)?,
            }
            Ok(())
        }
    }
}
