//! Ethereum JSON-RPC implementation of [`LedgerClient`].
//!
//! Deployments are sent with `eth_sendTransaction`, so the sender must be an account
//! managed by the node (Anvil, Hardhat, Geth dev mode...).

use std::time::Duration;

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::Address,
};
use anyhow::{Context, Result};
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use url::Url;

use super::{BlockInfo, DeployOptions, LedgerClient};
use crate::{artifact::AbiItem, rpc};

/// First delay between receipt polls.
const RECEIPT_MIN_DELAY: Duration = Duration::from_millis(250);
/// Upper bound for the delay between receipt polls.
const RECEIPT_MAX_DELAY: Duration = Duration::from_secs(4);
/// Number of receipt polls before giving up on a deployment.
const RECEIPT_MAX_ATTEMPTS: usize = 40;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    #[serde(deserialize_with = "rpc::deserialize_u64_from_hex")]
    number: u64,
    #[serde(deserialize_with = "rpc::deserialize_u64_from_hex")]
    gas_limit: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    status: Option<String>,
    contract_address: Option<Address>,
}

/// Build the creation payload: linked bytecode followed by the ABI encoded constructor
/// arguments.
///
/// Arguments are matched positionally with the inputs of the first constructor. JSON
/// strings are parsed as Solidity literals of the parameter type; other JSON values are
/// parsed from their JSON text, so `[1, 2]` works for a `uint256[]`.
pub fn encode_deployment(
    bytecode: &str,
    abi: &[AbiItem],
    constructor_args: &[Value],
) -> Result<String> {
    let bytecode = bytecode.strip_prefix("0x").unwrap_or(bytecode);
    hex::decode(bytecode).context("Bytecode is not valid hex (unlinked placeholders?)")?;

    let inputs = abi
        .iter()
        .find(|item| item.is_constructor())
        .map(|constructor| constructor.inputs.as_slice())
        .unwrap_or_default();

    if inputs.len() != constructor_args.len() {
        anyhow::bail!(
            "Constructor expects {} argument(s), got {}",
            inputs.len(),
            constructor_args.len()
        );
    }

    let mut data = format!("0x{bytecode}");
    if inputs.is_empty() {
        return Ok(data);
    }

    let values = inputs
        .iter()
        .zip(constructor_args)
        .map(|(param, arg)| -> Result<DynSolValue> {
            let ty_name = param.canonical_type();
            let ty = DynSolType::parse(&ty_name)
                .with_context(|| format!("Unsupported constructor parameter type {ty_name}"))?;
            let literal = match arg {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ty.coerce_str(&literal).with_context(|| {
                format!(
                    "Invalid value {literal} for constructor parameter `{}` ({ty_name})",
                    param.name
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    data.push_str(&hex::encode(DynSolValue::Tuple(values).abi_encode_params()));
    Ok(data)
}

/// [`LedgerClient`] backed by an HTTP JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpcLedger {
    client: reqwest::Client,
    url: Url,
}

impl JsonRpcLedger {
    pub fn new(url: Url) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        rpc::json_rpc_call(&self.client, &self.url, method, params).await
    }

    /// Poll `eth_getTransactionReceipt` with exponential backoff until the transaction is
    /// mined.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<Receipt> {
        let fetch = move || async move {
            let receipt: Option<Receipt> = self
                .call("eth_getTransactionReceipt", vec![json!(tx_hash)])
                .await?;
            receipt.with_context(|| format!("Transaction {tx_hash} is not mined yet"))
        };

        fetch
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(RECEIPT_MIN_DELAY)
                    .with_max_delay(RECEIPT_MAX_DELAY)
                    .with_max_times(RECEIPT_MAX_ATTEMPTS),
            )
            .sleep(tokio::time::sleep)
            .notify(|err: &anyhow::Error, dur: Duration| {
                tracing::trace!(error = %err, retry_in = ?dur, "Waiting for deployment receipt...");
            })
            .await
            .with_context(|| format!("No receipt for deployment transaction {tx_hash}"))
    }
}

impl LedgerClient for JsonRpcLedger {
    async fn get_latest_block(&self) -> Result<BlockInfo> {
        let block: RawBlock = self
            .call("eth_getBlockByNumber", vec![json!("latest"), json!(false)])
            .await
            .context("Failed to fetch latest block")?;

        Ok(BlockInfo {
            number: block.number,
            gas_limit: block.gas_limit,
        })
    }

    async fn list_accounts(&self) -> Result<Vec<Address>> {
        self.call("eth_accounts", vec![])
            .await
            .context("Failed to list accounts")
    }

    async fn deploy_contract(
        &self,
        bytecode: &str,
        abi: &[AbiItem],
        constructor_args: &[Value],
        options: &DeployOptions,
    ) -> Result<Address> {
        let data = encode_deployment(bytecode, abi, constructor_args)?;

        let tx_hash: String = self
            .call(
                "eth_sendTransaction",
                vec![json!({
                    "from": options.from,
                    "gas": format!("0x{:x}", options.gas),
                    "data": data,
                })],
            )
            .await
            .context("Failed to send deployment transaction")?;

        tracing::debug!(tx_hash = %tx_hash, "Deployment transaction sent");

        let receipt = self.wait_for_receipt(&tx_hash).await?;
        if receipt.status.as_deref() == Some("0x0") {
            anyhow::bail!("Deployment transaction {tx_hash} reverted");
        }

        receipt
            .contract_address
            .with_context(|| format!("Receipt of {tx_hash} has no contract address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::AbiParam;

    fn constructor(params: &[(&str, &str)]) -> Vec<AbiItem> {
        vec![AbiItem::constructor(
            params
                .iter()
                .map(|(name, ty)| AbiParam::new(*name, *ty))
                .collect(),
        )]
    }

    #[test]
    fn test_encode_without_constructor() {
        assert_eq!(encode_deployment("0x6080", &[], &[]).unwrap(), "0x6080");
        assert_eq!(encode_deployment("6080", &constructor(&[]), &[]).unwrap(), "0x6080");
    }

    #[test]
    fn test_encode_address_and_uint() {
        let abi = constructor(&[("inject_Lib", "address"), ("amount", "uint256")]);
        let data = encode_deployment(
            "6080",
            &abi,
            &[
                json!("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
                json!(1000),
            ],
        )
        .unwrap();

        assert_eq!(
            data,
            format!(
                "0x6080{}{}",
                "0000000000000000000000005fbdb2315678afecb367f032d93f642f64180aa3",
                "00000000000000000000000000000000000000000000000000000000000003e8",
            )
        );
    }

    #[test]
    fn test_encode_dynamic_array_from_json() {
        let abi = constructor(&[("values", "uint256[]")]);
        let data = encode_deployment("00", &abi, &[json!([1, 2])]).unwrap();
        // offset, length, two elements
        assert_eq!(data.len(), 2 + 2 + 4 * 64);
    }

    #[test]
    fn test_encode_argument_count_mismatch() {
        let abi = constructor(&[("amount", "uint256")]);
        assert!(encode_deployment("00", &abi, &[]).is_err());
        assert!(encode_deployment("00", &[], &[json!(1)]).is_err());
    }

    #[test]
    fn test_encode_rejects_unlinked_bytecode() {
        assert!(encode_deployment("600a__Lib_____600b", &[], &[]).is_err());
    }

    #[test]
    fn test_encode_rejects_bad_literal() {
        let abi = constructor(&[("flag", "bool")]);
        assert!(encode_deployment("00", &abi, &[json!("maybe")]).is_err());
    }
}
