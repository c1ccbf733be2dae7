//! solink-deploy - Dependency resolution and ordered deployment of contract artifacts.
//!
//! This crate extracts inter-contract dependencies from library placeholders and
//! `inject_`-prefixed constructor parameters, plans a deployment order over the resulting
//! graph, links library addresses into bytecode and deploys each contract through a
//! [`LedgerClient`].
//!
//! # Example
//!
//! ```no_run
//! use solink_deploy::{Deployer, JsonRpcLedger, RunConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let deployer = Deployer::from_dir("build".as_ref(), RunConfig::default())?;
//! let ledger = JsonRpcLedger::new("http://127.0.0.1:8545".parse()?)?;
//! let manifest = deployer.deploy(&ledger).await?;
//! manifest.save_to_file("deployment.json".as_ref())?;
//! # Ok(())
//! # }
//! ```

mod artifact;
pub use artifact::{AbiItem, AbiParam, ContractArtifact, load_artifacts, parse_artifacts};

mod config;
pub use config::{CONFIG_FILENAME, RunConfig};

mod deployer;
pub use deployer::Deployer;

mod error;
pub use error::{DeployError, DeployResult};

mod extract;
pub use extract::{
    INJECT_PREFIX, bytecode_dependencies, constructor_dependencies, extract_dependencies,
};

mod graph;
pub use graph::{DependencyGraph, build_graph};

pub mod ledger;
pub use ledger::{BlockInfo, DeployOptions, JsonRpcLedger, LedgerClient};

mod link;
pub use link::link;

mod manifest;
pub use manifest::{DeployedContract, Manifest};

mod orchestrator;
pub use orchestrator::{DeployContext, check_plan, deploy_all, resolve_constructor_args};

mod plan;
pub use plan::{DeploymentPlan, plan_order};

pub mod rpc;
