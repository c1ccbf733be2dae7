//! Compiled contract artifacts and loading them from a build directory.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use regex::Captures;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::DeployError, extract::PLACEHOLDER};

/// ABI member type tag for constructors.
pub const CONSTRUCTOR: &str = "constructor";

fn default_kind() -> String {
    "function".to_string()
}

/// A single named and typed ABI parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Tuple members, only set when `ty` starts with `tuple`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
    /// Any other field emitted by the compiler (`internalType`, `indexed`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AbiParam {
    /// Create a parameter with no components.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            components: Vec::new(),
            extra: Map::new(),
        }
    }

    /// The canonical Solidity type, expanding `tuple` into its component types.
    ///
    /// `tuple[]` with components `(uint256, address)` becomes `(uint256,address)[]`.
    pub fn canonical_type(&self) -> String {
        match self.ty.strip_prefix("tuple") {
            Some(suffix) => {
                let inner = self
                    .components
                    .iter()
                    .map(AbiParam::canonical_type)
                    .collect::<Vec<_>>()
                    .join(",");
                format!("({inner}){suffix}")
            }
            None => self.ty.clone(),
        }
    }
}

/// A single interface member of a contract ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiItem {
    /// The member kind: `function`, `constructor`, `event`, `fallback`, ...
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AbiItem {
    /// Create a constructor member with the given inputs.
    pub fn constructor(inputs: Vec<AbiParam>) -> Self {
        Self {
            kind: CONSTRUCTOR.to_string(),
            name: None,
            inputs,
            extra: Map::new(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == CONSTRUCTOR
    }
}

/// Compile output for one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifact {
    /// Unique contract name.
    pub name: String,
    pub abi: Vec<AbiItem>,
    /// Hex encoded creation bytecode without `0x` prefix. May contain library placeholders.
    pub bytecode: String,
}

impl ContractArtifact {
    pub fn new(name: impl Into<String>, abi: Vec<AbiItem>, bytecode: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            abi,
            bytecode: strip_hex_prefix(bytecode.as_ref()).to_string(),
        }
    }

    /// The first constructor of the ABI. Later constructors are ignored.
    pub fn constructor(&self) -> Option<&AbiItem> {
        self.abi.iter().find(|item| item.is_constructor())
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

/// Per-contract artifact file as written by most build tools.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    contract_name: Option<String>,
    abi: Vec<AbiItem>,
    #[serde(alias = "bin")]
    bytecode: BytecodeField,
}

/// Bytecode is either a plain hex string or a `{ "object": "..." }` wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

impl BytecodeField {
    fn into_hex(self) -> String {
        match self {
            Self::Hex(hex) | Self::Object { object: hex } => hex,
        }
    }
}

/// A solc `--combined-json abi,bin` document.
#[derive(Debug, Deserialize)]
struct CombinedJson {
    contracts: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CombinedContract {
    abi: Value,
    bin: String,
}

/// Longest contract key solc writes into a library placeholder.
const PLACEHOLDER_KEY_LEN: usize = 36;

/// Rewrite placeholders that carry a fully qualified `path:Name` key (possibly truncated
/// to [`PLACEHOLDER_KEY_LEN`] characters) into placeholders of the short contract name.
///
/// Unknown placeholders are left untouched.
fn shorten_placeholders(bytecode: &str, short_names: &HashMap<&str, &str>) -> String {
    PLACEHOLDER
        .replace_all(bytecode, |caps: &Captures| match short_names.get(&caps[1]) {
            Some(short) => format!("__{short:_<38}"),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Parse the artifacts contained in one JSON document.
///
/// `fallback_name` names a per-contract artifact that does not carry `contractName`.
pub fn parse_artifacts(content: &str, fallback_name: &str) -> Result<Vec<ContractArtifact>> {
    let value: Value = serde_json::from_str(content).context("Failed to parse artifact JSON")?;

    if value.get("contracts").is_some_and(Value::is_object) {
        let combined: CombinedJson =
            serde_json::from_value(value).context("Failed to parse combined-json document")?;

        // Placeholders reference `path:Name`, artifacts are named `Name`.
        let mut short_names = HashMap::new();
        for key in combined.contracts.keys() {
            let short = key.rsplit(':').next().unwrap_or(key);
            short_names.insert(key.as_str(), short);
            short_names
                .entry(key.get(..PLACEHOLDER_KEY_LEN).unwrap_or(key))
                .or_insert(short);
        }

        return combined
            .contracts
            .iter()
            .map(|(key, contract)| -> Result<ContractArtifact> {
                let contract = CombinedContract::deserialize(contract)
                    .with_context(|| format!("Failed to parse combined-json entry {key}"))?;
                // Older solc releases emit the ABI as an encoded JSON string.
                let abi = match contract.abi {
                    Value::String(encoded) => serde_json::from_str(&encoded),
                    other => serde_json::from_value(other),
                }
                .with_context(|| format!("Failed to parse ABI of {key}"))?;
                let bytecode = shorten_placeholders(&contract.bin, &short_names);
                Ok(ContractArtifact::new(short_names[key.as_str()], abi, bytecode))
            })
            .collect();
    }

    let file: ArtifactFile =
        serde_json::from_value(value).context("Failed to parse contract artifact")?;
    let name = file
        .contract_name
        .unwrap_or_else(|| fallback_name.to_string());
    Ok(vec![ContractArtifact::new(
        name,
        file.abi,
        file.bytecode.into_hex(),
    )])
}

/// Load every `*.json` artifact in `dir`.
///
/// Files are read in file-name order so the resulting artifact order, and therefore the
/// deployment plan, is reproducible across runs.
pub fn load_artifacts(dir: &Path) -> Result<Vec<ContractArtifact>> {
    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read artifact directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to list artifact directory {}", dir.display()))?;
    paths.retain(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"));
    paths.sort();

    let mut artifacts: Vec<ContractArtifact> = Vec::new();
    for path in paths {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = parse_artifacts(&content, &stem)
            .with_context(|| format!("Invalid artifact file {}", path.display()))?;

        for artifact in parsed {
            if artifacts.iter().any(|a| a.name == artifact.name) {
                return Err(DeployError::DuplicateContract(artifact.name).into());
            }
            tracing::debug!(contract = %artifact.name, path = %path.display(), "Loaded artifact");
            artifacts.push(artifact);
        }
    }

    tracing::info!(count = artifacts.len(), dir = %dir.display(), "Artifacts loaded");
    Ok(artifacts)
}
