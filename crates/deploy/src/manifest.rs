//! Deployment manifest: the output of a successful run.

use std::{collections::BTreeMap, path::Path};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use comfy_table::{Table, presets::UTF8_FULL};
use serde::{Deserialize, Serialize};

use crate::artifact::AbiItem;

/// A contract with a known on-chain address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub name: String,
    pub abi: Vec<AbiItem>,
    pub address: Address,
}

/// Every contract of a run, in deployment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Unix timestamp of the end of the run.
    pub deployed_at: i64,
    /// Solink version that produced this manifest.
    pub solink_version: String,
    pub contracts: Vec<DeployedContract>,
}

impl Manifest {
    pub fn new(contracts: Vec<DeployedContract>) -> Self {
        Self {
            deployed_at: chrono::Utc::now().timestamp(),
            solink_version: env!("CARGO_PKG_VERSION").to_string(),
            contracts,
        }
    }

    pub fn get(&self, name: &str) -> Option<&DeployedContract> {
        self.contracts.iter().find(|c| c.name == name)
    }

    /// Contract addresses by name, in the shape of `RunConfig::deployed_contracts`, so a
    /// later run can reuse them.
    pub fn addresses(&self) -> BTreeMap<String, Address> {
        self.contracts
            .iter()
            .map(|c| (c.name.clone(), c.address))
            .collect()
    }

    /// Render the manifest as a table.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["#", "Contract", "Address"]);
        for (i, contract) in self.contracts.iter().enumerate() {
            table.add_row(vec![
                i.to_string(),
                contract.name.clone(),
                contract.address.to_string(),
            ]);
        }
        table
    }

    /// Save the manifest as formatted JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write manifest to {}", path.display()))?;

        tracing::info!(path = %path.display(), "Manifest saved");
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Manifest file does not exist: {}", path.display());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest from {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse manifest JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::address;
    use tempdir::TempDir;

    fn manifest() -> Manifest {
        Manifest {
            deployed_at: 1737316800,
            solink_version: "0.1.0".to_string(),
            contracts: vec![
                DeployedContract {
                    name: "Math".to_string(),
                    abi: vec![],
                    address: address!("5fbdb2315678afecb367f032d93f642f64180aa3"),
                },
                DeployedContract {
                    name: "Token".to_string(),
                    abi: vec![AbiItem::constructor(vec![])],
                    address: address!("e7f1725e7734ce288f8367e1bb143e90bb3f0512"),
                },
            ],
        }
    }

    #[test]
    fn test_manifest_save_and_load() {
        let temp_dir = TempDir::new("solink-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("deployment.json");

        let original = manifest();
        original.save_to_file(&path).expect("Failed to save manifest");
        let loaded = Manifest::load_from_file(&path).expect("Failed to load manifest");

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_manifest_load_corrupted_file() {
        let temp_dir = TempDir::new("solink-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("deployment.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        assert!(Manifest::load_from_file(&path).is_err());
        assert!(Manifest::load_from_file(&temp_dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_addresses_feed_reuse() {
        let manifest = manifest();
        let addresses = manifest.addresses();
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses["Token"], manifest.get("Token").unwrap().address);
    }

    #[test]
    fn test_table_lists_contracts() {
        let rendered = manifest().to_table().to_string();
        assert!(rendered.contains("Math"));
        assert!(rendered.contains("Token"));
    }
}
