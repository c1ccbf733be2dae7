//! Link-time substitution of library addresses into bytecode.

use std::collections::HashMap;

use alloy_core::primitives::Address;
use regex::Captures;

use crate::{
    artifact::ContractArtifact,
    error::{DeployError, DeployResult},
    extract::{PLACEHOLDER, bytecode_dependencies},
};

/// Replace every placeholder of `library` in `bytecode` with `hex_address`.
///
/// This is a literal textual substitution of the whole placeholder token.
fn replace_placeholders(bytecode: &str, library: &str, hex_address: &str) -> String {
    PLACEHOLDER
        .replace_all(bytecode, |caps: &Captures| {
            if &caps[1] == library {
                hex_address.to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Return a copy of `artifact` with every library placeholder replaced by the address
/// of that library in `resolved`.
///
/// Fails with [`DeployError::UnresolvedDependency`] if a referenced library has no
/// address. Linking bytecode without placeholders returns it unchanged.
pub fn link(
    artifact: &ContractArtifact,
    resolved: &HashMap<String, Address>,
) -> DeployResult<ContractArtifact> {
    let mut bytecode = artifact.bytecode.clone();

    for library in bytecode_dependencies(&artifact.bytecode) {
        let address = resolved
            .get(&library)
            .ok_or_else(|| DeployError::UnresolvedDependency {
                contract: artifact.name.clone(),
                name: library.clone(),
            })?;

        bytecode = replace_placeholders(&bytecode, &library, &hex::encode(address.as_slice()));
        tracing::debug!(
            contract = %artifact.name,
            library = %library,
            address = %address,
            "Linked library"
        );
    }

    Ok(ContractArtifact {
        bytecode,
        ..artifact.clone()
    })
}
