use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use comfy_table::{Table, presets::UTF8_FULL};

use crate::{
    ContractArtifact, DeployContext, DeployError, DeployResult, DeploymentPlan, LedgerClient,
    Manifest, RunConfig, build_graph, check_plan, deploy_all, extract_dependencies,
    load_artifacts, plan_order,
};

/// Main deployer that plans and deploys a set of contract artifacts.
///
/// Artifacts are kept in the order they were supplied; that order drives graph
/// construction and therefore the deployment plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployer {
    artifacts: Vec<ContractArtifact>,
    /// Options of the run.
    pub config: RunConfig,
}

impl Deployer {
    /// Create a deployer, rejecting duplicate contract names.
    pub fn new(artifacts: Vec<ContractArtifact>, config: RunConfig) -> DeployResult<Self> {
        for (i, artifact) in artifacts.iter().enumerate() {
            if artifacts[..i].iter().any(|a| a.name == artifact.name) {
                return Err(DeployError::DuplicateContract(artifact.name.clone()));
            }
        }
        Ok(Self { artifacts, config })
    }

    /// Create a deployer from every artifact in `dir`.
    pub fn from_dir(dir: &Path, config: RunConfig) -> Result<Self> {
        let artifacts = load_artifacts(dir)?;
        Self::new(artifacts, config).context("Invalid artifact set")
    }

    pub fn artifacts(&self) -> &[ContractArtifact] {
        &self.artifacts
    }

    /// Compute the deployment order.
    pub fn plan(&self) -> DeployResult<DeploymentPlan> {
        let graph = build_graph(&self.artifacts)?;
        let plan = plan_order(&graph);
        tracing::info!(order = ?plan.as_slice(), "Deployment order computed");
        Ok(plan)
    }

    /// Render the plan with each contract's dependencies and whether it will be reused.
    pub fn plan_table(&self, plan: &DeploymentPlan) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["#", "Contract", "Dependencies", "Action"]);
        for (i, name) in plan.iter().enumerate() {
            let dependencies = self
                .artifacts
                .iter()
                .find(|a| &a.name == name)
                .map(|a| extract_dependencies(a).join(", "))
                .unwrap_or_default();
            let configured = self.config.deployed_contracts.get(name);
            let action = match (configured, self.has_artifact(name)) {
                (Some(address), _) => format!("reuse {address}"),
                (None, true) => "deploy".to_string(),
                (None, false) => "missing".to_string(),
            };
            table.add_row(vec![i.to_string(), name.clone(), dependencies, action]);
        }
        table
    }

    fn has_artifact(&self, name: &str) -> bool {
        self.artifacts.iter().any(|a| a.name == name)
    }

    fn artifacts_by_name(&self) -> HashMap<String, ContractArtifact> {
        self.artifacts
            .iter()
            .map(|a| (a.name.clone(), a.clone()))
            .collect()
    }

    /// Plan and deploy every contract through `ledger`.
    ///
    /// Nothing is sent to the network if planning fails. A failure during deployment
    /// aborts the run without output.
    pub async fn deploy<L: LedgerClient>(&self, ledger: &L) -> Result<Manifest> {
        tracing::info!("Starting deployment process...");

        let plan = self.plan()?;
        let by_name = self.artifacts_by_name();
        check_plan(&self.config, &plan, &by_name)?;

        let options = self
            .config
            .resolve(ledger)
            .await
            .context("Failed to resolve deployment options")?;
        tracing::info!(from = %options.from, gas = options.gas, "Deploying contracts...");

        let ctx = DeployContext { ledger, options };
        let contracts = deploy_all(&ctx, &self.config, &plan, &by_name).await?;

        tracing::info!(count = contracts.len(), "✓ Deployment complete!");
        Ok(Manifest::new(contracts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_rejected() {
        let artifacts = vec![
            ContractArtifact::new("Lib", vec![], "00"),
            ContractArtifact::new("Lib", vec![], "01"),
        ];
        let err = Deployer::new(artifacts, RunConfig::default()).unwrap_err();
        assert!(matches!(err, DeployError::DuplicateContract(ref name) if name == "Lib"));
    }

    #[test]
    fn test_missing_library_reported_against_dependent() {
        let deployer = Deployer::new(
            vec![ContractArtifact::new("App", vec![], "60__External____")],
            RunConfig::default(),
        )
        .unwrap();
        let plan = deployer.plan().unwrap();
        assert_eq!(*plan, vec!["External", "App"]);

        let err = check_plan(&deployer.config, &plan, &deployer.artifacts_by_name()).unwrap_err();
        assert!(matches!(
            err,
            DeployError::UnresolvedDependency { ref contract, ref name }
                if contract == "App" && name == "External"
        ));
    }

    #[test]
    fn test_plan_table_shows_actions() {
        let mut config = RunConfig::default();
        config
            .deployed_contracts
            .insert("External".to_string(), alloy_core::primitives::Address::ZERO);
        let deployer = Deployer::new(
            vec![ContractArtifact::new("App", vec![], "60__External____")],
            config,
        )
        .unwrap();
        let plan = deployer.plan().unwrap();
        check_plan(&deployer.config, &plan, &deployer.artifacts_by_name()).unwrap();

        let rendered = deployer.plan_table(&plan).to_string();
        assert!(rendered.contains("reuse"));
        assert!(rendered.contains("deploy"));
    }
}
