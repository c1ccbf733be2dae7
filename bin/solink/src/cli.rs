use std::path::PathBuf;

use alloy_core::primitives::Address;
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use url::Url;

/// The default JSON-RPC endpoint (a local Anvil or Hardhat node).
const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Parser)]
#[command(name = "solink")]
#[command(
    author,
    version,
    about = "Link and deploy contract artifacts in dependency order"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(
        short,
        long,
        global = true,
        env = "SOLINK_VERBOSITY",
        default_value_t = LevelFilter::INFO
    )]
    pub verbosity: LevelFilter,

    /// Path to a Solink.toml configuration file (or a directory containing one).
    ///
    /// Values from the environment (`SOLINK_FROM`, `SOLINK_GAS_LIMIT`) and from the
    /// command line take precedence over the file.
    #[arg(long, global = true, alias = "conf", env = "SOLINK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the deployment order without touching the network.
    Plan(PlanArgs),
    /// Link and deploy every artifact.
    Deploy(DeployArgs),
}

#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// Directory containing the JSON build artifacts.
    pub artifacts: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct DeployArgs {
    /// Directory containing the JSON build artifacts.
    pub artifacts: PathBuf,

    /// The URL of the JSON-RPC endpoint to deploy to.
    #[arg(long, alias = "rpc", env = "SOLINK_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: Url,

    /// The deploying account. Defaults to the first account of the node.
    #[arg(long)]
    pub from: Option<Address>,

    /// Gas limit of each deployment. Defaults to the latest block gas limit.
    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// Reuse the addresses of a previous deployment manifest.
    ///
    /// Contracts present in the manifest are not redeployed.
    #[arg(long, env = "SOLINK_REUSE")]
    pub reuse: Option<PathBuf>,

    /// Where to write the deployment manifest.
    #[arg(short, long, env = "SOLINK_OUT", default_value = "deployment.json")]
    pub out: PathBuf,
}
