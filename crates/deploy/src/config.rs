//! Run configuration.

use std::{collections::BTreeMap, path::Path};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ledger::{DeployOptions, LedgerClient};

/// The default name for the solink configuration file.
pub const CONFIG_FILENAME: &str = "Solink.toml";

/// Options of a deployment run.
///
/// Every field is optional; [`RunConfig::resolve`] fills `from` and `gas_limit` from the
/// ledger client when they are not set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Deploying account. Defaults to the first account of the ledger client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Gas ceiling of each deployment. Defaults to the latest block's gas limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// Literal constructor arguments per contract. Injected dependency addresses are
    /// appended after them.
    pub constructor_params: BTreeMap<String, Vec<Value>>,
    /// Contracts that are already deployed. They are never linked or redeployed.
    pub deployed_contracts: BTreeMap<String, Address>,
}

impl RunConfig {
    /// Resolve the transaction options of the run, querying the ledger for unset values.
    pub async fn resolve<L: LedgerClient>(&self, ledger: &L) -> Result<DeployOptions> {
        let from = match self.from {
            Some(from) => from,
            None => ledger
                .list_accounts()
                .await?
                .into_iter()
                .next()
                .context("Ledger client has no accounts to deploy from")?,
        };

        let gas = match self.gas_limit {
            Some(gas) => gas,
            None => ledger.get_latest_block().await?.gas_limit,
        };

        tracing::debug!(from = %from, gas, "Resolved deployment options");
        Ok(DeployOptions { from, gas })
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize run config to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file, or from [`CONFIG_FILENAME`] inside a
    /// directory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration file or directory not found: {}",
                path.display()
            );
        }

        let config_path = if path.is_dir() {
            path.join(CONFIG_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse config file as TOML")?;
        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }
}
