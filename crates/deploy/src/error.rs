//! Error types for dependency resolution and ordered deployment.

use thiserror::Error;

/// Errors raised while planning, linking or deploying a set of contracts.
///
/// Every variant is fatal to the run: nothing is retried and no partial output is produced.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Adding the edge `from -> to` would have introduced a dependency cycle.
    #[error("dependency cycle detected: `{from}` -> `{to}` closes a cycle")]
    Cycle { from: String, to: String },

    /// A dependency had no known address when `contract` needed it.
    #[error("unresolved dependency `{name}` required by `{contract}`")]
    UnresolvedDependency { contract: String, name: String },

    /// The ledger client failed to deploy a contract.
    #[error("failed to deploy `{name}`: {source}")]
    Deployment {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A contract was named (by the plan or as a dependency) but no artifact or configured
    /// address exists for it.
    #[error("no artifact or configured address for contract `{0}`")]
    UnknownContract(String),

    /// Two artifacts share the same contract name.
    #[error("duplicate artifact for contract `{0}`")]
    DuplicateContract(String),
}

pub type DeployResult<T> = Result<T, DeployError>;
