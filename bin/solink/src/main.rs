//! solink is a CLI tool to link and deploy a set of contract artifacts in dependency order.

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use cli::{Cli, Command, DeployArgs, PlanArgs};
use solink_deploy::{CONFIG_FILENAME, Deployer, JsonRpcLedger, Manifest, RunConfig};

/// Merge the run configuration: defaults, then the TOML file, then `SOLINK_*` variables.
fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let mut figment = Figment::from(Serialized::defaults(RunConfig::default()));

    match path {
        Some(path) => {
            let file = if path.is_dir() {
                path.join(CONFIG_FILENAME)
            } else {
                path.to_path_buf()
            };
            if !file.is_file() {
                anyhow::bail!("Configuration file not found: {}", file.display());
            }
            figment = figment.merge(Toml::file(file));
        }
        None => figment = figment.merge(Toml::file(CONFIG_FILENAME)),
    }

    figment
        .merge(Env::prefixed("SOLINK_").only(&["from", "gas_limit"]))
        .extract()
        .context("Failed to load configuration")
}

fn plan(config: RunConfig, args: PlanArgs) -> Result<()> {
    let deployer = Deployer::from_dir(&args.artifacts, config)?;
    let plan = deployer.plan()?;

    println!("{}", deployer.plan_table(&plan));
    Ok(())
}

async fn deploy(mut config: RunConfig, args: DeployArgs) -> Result<()> {
    if let Some(from) = args.from {
        config.from = Some(from);
    }
    if let Some(gas_limit) = args.gas_limit {
        config.gas_limit = Some(gas_limit);
    }
    if let Some(reuse) = &args.reuse {
        let previous = Manifest::load_from_file(reuse)?;
        tracing::info!(
            path = %reuse.display(),
            contracts = previous.contracts.len(),
            "Reusing previous deployment"
        );
        for (name, address) in previous.addresses() {
            config.deployed_contracts.entry(name).or_insert(address);
        }
    }

    let deployer = Deployer::from_dir(&args.artifacts, config)?;
    let ledger = JsonRpcLedger::new(args.rpc_url.clone())?;

    tracing::info!(
        artifacts = deployer.artifacts().len(),
        rpc_url = %args.rpc_url,
        "Loaded deployment from artifacts directory..."
    );

    let manifest = deployer.deploy(&ledger).await?;
    manifest.save_to_file(&args.out)?;

    println!("{}", manifest.to_table());
    Ok(())
}


#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Plan(args) => plan(config, args),
        Command::Deploy(args) => deploy(config, args).await,
    }
}
