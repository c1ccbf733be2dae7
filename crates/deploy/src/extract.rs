//! Dependency extraction from bytecode placeholders and constructor parameters.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

use crate::artifact::{AbiItem, ContractArtifact};

/// Name prefix marking a constructor `address` parameter as an injected dependency.
pub const INJECT_PREFIX: &str = "inject_";

/// Library placeholder: two underscores, a name without underscores, then padding
/// underscores. The padding width is not validated.
pub(crate) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)_*").expect("placeholder pattern is valid"));

fn push_unique(names: &mut Vec<String>, seen: &mut HashSet<String>, name: &str) {
    if seen.insert(name.to_string()) {
        names.push(name.to_string());
    }
}

/// Library names referenced by placeholders in `bytecode`, in first-occurrence order.
pub fn bytecode_dependencies(bytecode: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for caps in PLACEHOLDER.captures_iter(bytecode) {
        push_unique(&mut names, &mut seen, &caps[1]);
    }
    names
}

/// Dependencies injected through the first constructor of `abi`.
///
/// Only `address` parameters named `inject_<Name>` count. Overloaded constructors after
/// the first one are ignored.
pub fn constructor_dependencies(abi: &[AbiItem]) -> Vec<String> {
    let Some(constructor) = abi.iter().find(|item| item.is_constructor()) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for input in &constructor.inputs {
        if input.ty != "address" {
            continue;
        }
        if let Some(name) = input.name.strip_prefix(INJECT_PREFIX) {
            push_unique(&mut names, &mut seen, name);
        }
    }
    names
}

/// All dependencies of `artifact`: bytecode placeholders first, then constructor
/// injections, duplicates collapsed.
pub fn extract_dependencies(artifact: &ContractArtifact) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for name in bytecode_dependencies(&artifact.bytecode)
        .iter()
        .chain(constructor_dependencies(&artifact.abi).iter())
    {
        push_unique(&mut names, &mut seen, name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::AbiParam;

    #[test]
    fn test_bytecode_placeholder() {
        assert_eq!(bytecode_dependencies("600a__Lib_____600b"), vec!["Lib"]);
    }

    #[test]
    fn test_bytecode_placeholders_deduplicated_in_order() {
        let bytecode = format!(
            "60{}61{}62{}",
            "__Math______________________________________",
            "__Strings___________________________________",
            "__Math______________________________________",
        );
        assert_eq!(bytecode_dependencies(&bytecode), vec!["Math", "Strings"]);
    }

    #[test]
    fn test_bytecode_without_placeholders() {
        assert!(bytecode_dependencies("6080604052348015600f57600080fd5b50").is_empty());
        assert!(bytecode_dependencies("").is_empty());
    }

    #[test]
    fn test_constructor_injection() {
        let abi = vec![AbiItem::constructor(vec![
            AbiParam::new("inject_Lib", "address"),
            AbiParam::new("amount", "uint256"),
        ])];
        assert_eq!(constructor_dependencies(&abi), vec!["Lib"]);
    }

    #[test]
    fn test_constructor_injection_requires_address_type() {
        let abi = vec![AbiItem::constructor(vec![
            AbiParam::new("inject_Count", "uint256"),
            AbiParam::new("owner", "address"),
            AbiParam::new("inject_Registry", "address"),
            AbiParam::new("inject_Registry", "address"),
        ])];
        assert_eq!(constructor_dependencies(&abi), vec!["Registry"]);
    }

    #[test]
    fn test_only_first_constructor_is_consulted() {
        let abi = vec![
            AbiItem::constructor(vec![AbiParam::new("inject_First", "address")]),
            AbiItem::constructor(vec![AbiParam::new("inject_Second", "address")]),
        ];
        assert_eq!(constructor_dependencies(&abi), vec!["First"]);
    }

    #[test]
    fn test_union_lists_bytecode_first() {
        let artifact = ContractArtifact::new(
            "App",
            vec![AbiItem::constructor(vec![
                AbiParam::new("inject_Registry", "address"),
                AbiParam::new("inject_Lib", "address"),
            ])],
            "600a__Lib_____600b",
        );
        assert_eq!(extract_dependencies(&artifact), vec!["Lib", "Registry"]);
    }
}
