//! The ledger client capability the deployment engine drives.
//!
//! The engine only needs three operations from a network: the latest block (for the
//! default gas limit), the list of node-managed accounts (for the default sender) and
//! contract creation. [`JsonRpcLedger`] implements them over Ethereum JSON-RPC.

use std::future::Future;

use alloy_core::primitives::Address;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::AbiItem;

mod json_rpc;
pub use json_rpc::{JsonRpcLedger, encode_deployment};

/// Header fields of the latest block that the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub number: u64,
    pub gas_limit: u64,
}

/// Transaction options applied to every deployment of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployOptions {
    /// Deploying account.
    pub from: Address,
    /// Gas ceiling for each deployment transaction.
    pub gas: u64,
}

/// Asynchronous access to a blockchain network.
pub trait LedgerClient: Send + Sync {
    /// Fetch the latest block.
    fn get_latest_block(&self) -> impl Future<Output = Result<BlockInfo>> + Send;

    /// List the accounts the node can send transactions from.
    fn list_accounts(&self) -> impl Future<Output = Result<Vec<Address>>> + Send;

    /// Deploy fully linked `bytecode`, passing `constructor_args` to the first constructor
    /// of `abi`, and return the address of the created contract.
    fn deploy_contract(
        &self,
        bytecode: &str,
        abi: &[AbiItem],
        constructor_args: &[Value],
        options: &DeployOptions,
    ) -> impl Future<Output = Result<Address>> + Send;
}
