//! CLI command definitions and dispatch.

mod attach;
mod blob;
mod copy;
mod index;
mod manifest;
mod pull;
mod pull_platform;
mod push;
mod push_multiplatform;
mod referrers;
mod tags;

use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use orca_client::{DistributionTransport, RegistryAuth};

/// Orca — push and pull OCI artifacts.
#[derive(Parser)]
#[command(name = "orca", version, about)]
pub struct Cli {
    /// Use plain HTTP instead of TLS
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Registry username (falls back to ORAS_USERNAME)
    #[arg(short = 'u', long, global = true)]
    pub username: Option<String>,

    /// Registry password (falls back to ORAS_PASSWORD)
    #[arg(short = 'p', long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Push local files to a reference as an artifact
    Push(push::PushArgs),
    /// Pull an artifact and materialize its layers to a directory
    Pull(pull::PullArgs),
    /// Print the manifest (or index) stored at a reference
    Manifest(manifest::ManifestArgs),
    /// Copy an artifact between references
    Copy(copy::CopyArgs),
    /// Attach files to an existing manifest as a referring artifact
    Attach(attach::AttachArgs),
    /// Push or fetch a single blob by digest
    #[command(subcommand)]
    Blob(blob::BlobCommand),
    /// Create or inspect a multi-platform manifest index
    #[command(subcommand, name = "manifest-index")]
    ManifestIndex(index::IndexCommand),
    /// Pull an artifact for an explicit target platform
    PullPlatform(pull_platform::PullPlatformArgs),
    /// Push one artifact per platform plus an index tying them together
    PushMultiplatform(push_multiplatform::PushMultiplatformArgs),
    /// List repository tags
    Tags(tags::TagsArgs),
    /// List artifacts referring to a subject manifest
    Referrers(referrers::ReferrersArgs),
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let auth = match (cli.username, cli.password) {
        (Some(username), Some(password)) => RegistryAuth::basic(username, password),
        _ => RegistryAuth::from_env(),
    };
    let transport = DistributionTransport::new(cli.insecure, auth);

    match cli.command {
        Command::Push(args) => push::execute(args, transport).await,
        Command::Pull(args) => pull::execute(args, transport).await,
        Command::Manifest(args) => manifest::execute(args, transport).await,
        Command::Copy(args) => copy::execute(args, transport).await,
        Command::Attach(args) => attach::execute(args, transport).await,
        Command::Blob(args) => blob::execute(args, transport).await,
        Command::ManifestIndex(args) => index::execute(args, transport).await,
        Command::PullPlatform(args) => pull_platform::execute(args, transport).await,
        Command::PushMultiplatform(args) => push_multiplatform::execute(args, transport).await,
        Command::Tags(args) => tags::execute(args, transport).await,
        Command::Referrers(args) => referrers::execute(args, transport).await,
    }
}

/// Parse a `key=value` annotation argument.
pub(crate) fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("invalid annotation '{}', expected key=value", s))
}

/// Collect parsed `key=value` pairs into an annotation map.
pub(crate) fn annotation_map(pairs: Vec<(String, String)>) -> Option<BTreeMap<String, String>> {
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.into_iter().collect())
    }
}
