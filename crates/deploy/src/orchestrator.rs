//! Ordered deployment of a planned set of contracts.

use std::collections::{HashMap, HashSet};

use alloy_core::primitives::Address;
use serde_json::Value;

use crate::{
    artifact::ContractArtifact,
    config::RunConfig,
    error::{DeployError, DeployResult},
    extract::{constructor_dependencies, extract_dependencies},
    ledger::{DeployOptions, LedgerClient},
    link::link,
    manifest::DeployedContract,
    plan::DeploymentPlan,
};

/// Everything a deployment run needs from its environment.
pub struct DeployContext<'a, L> {
    pub ledger: &'a L,
    pub options: DeployOptions,
}

/// Configured constructor arguments of `artifact` followed by the address of each
/// constructor-injected dependency.
pub fn resolve_constructor_args(
    artifact: &ContractArtifact,
    configured: Option<&Vec<Value>>,
    resolved: &HashMap<String, Address>,
) -> DeployResult<Vec<Value>> {
    let mut args = configured.cloned().unwrap_or_default();
    for name in constructor_dependencies(&artifact.abi) {
        let address = resolved
            .get(&name)
            .ok_or_else(|| DeployError::UnresolvedDependency {
                contract: artifact.name.clone(),
                name: name.clone(),
            })?;
        args.push(Value::String(address.to_string()));
    }
    Ok(args)
}

/// Check that every contract of `plan` can be resolved when its turn comes, without
/// touching the ledger.
///
/// A dependency with neither a configured address nor an artifact, or one planned after
/// its dependent, fails the first dependent that needs it with
/// [`DeployError::UnresolvedDependency`]. A planned name that nothing depends on and
/// that has no artifact or address fails with [`DeployError::UnknownContract`].
pub fn check_plan(
    config: &RunConfig,
    plan: &DeploymentPlan,
    artifacts: &HashMap<String, ContractArtifact>,
) -> DeployResult<()> {
    let required: HashSet<String> = plan
        .iter()
        .filter_map(|name| artifacts.get(name))
        .flat_map(extract_dependencies)
        .collect();
    let mut available: HashSet<&str> = HashSet::with_capacity(plan.len());

    for name in plan.iter() {
        if config.deployed_contracts.contains_key(name) {
            available.insert(name.as_str());
            continue;
        }

        let Some(artifact) = artifacts.get(name) else {
            if !required.contains(name) {
                return Err(DeployError::UnknownContract(name.clone()));
            }
            continue;
        };

        if let Some(missing) = extract_dependencies(artifact)
            .into_iter()
            .find(|dep| !available.contains(dep.as_str()))
        {
            return Err(DeployError::UnresolvedDependency {
                contract: name.clone(),
                name: missing,
            });
        }
        available.insert(name.as_str());
    }

    Ok(())
}

/// Deploy every contract of `plan` in order.
///
/// Contracts listed in `config.deployed_contracts` are recorded with their configured
/// address and never linked or deployed. Every other contract is linked against the
/// addresses recorded so far, then deployed; deployments never overlap. The first
/// failure aborts the run and contracts already deployed stay on chain.
///
/// The plan is checked with [`check_plan`] first, so unresolvable dependencies fail the
/// run before anything is deployed.
pub async fn deploy_all<L: LedgerClient>(
    ctx: &DeployContext<'_, L>,
    config: &RunConfig,
    plan: &DeploymentPlan,
    artifacts: &HashMap<String, ContractArtifact>,
) -> DeployResult<Vec<DeployedContract>> {
    check_plan(config, plan, artifacts)?;

    let mut addresses: HashMap<String, Address> = HashMap::with_capacity(plan.len());
    let mut deployed = Vec::with_capacity(plan.len());

    for name in plan.iter() {
        let artifact = artifacts.get(name);

        if let Some(&address) = config.deployed_contracts.get(name) {
            tracing::info!(contract = %name, address = %address, "Reusing deployed contract");
            addresses.insert(name.clone(), address);
            deployed.push(DeployedContract {
                name: name.clone(),
                abi: artifact.map(|a| a.abi.clone()).unwrap_or_default(),
                address,
            });
            continue;
        }

        // Only reachable for dependencies of reused contracts, which nothing needs.
        let Some(artifact) = artifact else {
            tracing::debug!(contract = %name, "Skipping contract without artifact");
            continue;
        };
        let linked = link(artifact, &addresses)?;
        let args =
            resolve_constructor_args(artifact, config.constructor_params.get(name), &addresses)?;

        tracing::info!(contract = %name, args = args.len(), "Deploying contract...");
        let address = ctx
            .ledger
            .deploy_contract(&linked.bytecode, &linked.abi, &args, &ctx.options)
            .await
            .map_err(|source| DeployError::Deployment {
                name: name.clone(),
                source: source.into(),
            })?;
        tracing::info!(contract = %name, address = %address, "Contract deployed");

        addresses.insert(name.clone(), address);
        deployed.push(DeployedContract {
            name: name.clone(),
            abi: linked.abi,
            address,
        });
    }

    Ok(deployed)
}
