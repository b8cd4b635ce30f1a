//! EVM chain client (Ethereum, Base and other EVM-compatible chains).
//!
//! A transaction counts as settled once it has a receipt and its block meets
//! the requested [`Consistency`]: enough confirmations below the head, or at
//! or below the `finalized` block tag.

use super::rpc::JsonRpcClient;
use super::{ChainClient, RawTransactionRecord};
use crate::error::ChainError;
use crate::types::{Asset, Chain, Consistency, TransactionReference, TransferEvent};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

alloy_sol_types::sol! {
    /// ERC-20 transfer event.
    event Transfer(address indexed from, address indexed to, uint256 value);
}

// RPC response structures - some fields unused but required for deserialization
#[allow(dead_code)]
mod rpc_types {
    use super::EvmLog;
    use alloy_primitives::{Address, B256, U256, U64};
    use serde::Deserialize;

    /// Transaction object from eth_getTransactionByHash.
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionObject {
        pub hash: B256,
        pub from: Address,
        pub to: Option<Address>,
        pub value: U256,
        pub block_number: Option<U64>,
    }

    /// Receipt from eth_getTransactionReceipt.
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceiptObject {
        pub transaction_hash: B256,
        pub block_number: Option<U64>,
        /// Absent on pre-Byzantium receipts.
        pub status: Option<U64>,
        #[serde(default)]
        pub logs: Vec<EvmLog>,
    }

    /// Header fields we read from eth_getBlockByNumber.
    #[derive(Debug, Deserialize)]
    pub struct BlockHeader {
        pub number: U64,
    }
}

use rpc_types::*;

/// A log entry emitted by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvmLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// A mined EVM transaction together with its receipt.
#[derive(Debug, Clone)]
pub struct EvmTransaction {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub block_number: u64,
    pub succeeded: bool,
    pub logs: Vec<EvmLog>,
}

impl EvmTransaction {
    /// Execution error, if the transaction reverted.
    pub fn failure(&self) -> Option<String> {
        if self.succeeded {
            None
        } else {
            Some(format!("transaction {} reverted", self.hash))
        }
    }

    /// The top-level value transfer, if any.
    pub fn native_transfers(&self) -> Vec<TransferEvent> {
        match self.to {
            Some(to) if !self.value.is_zero() => vec![TransferEvent {
                source: Some(self.from.to_checksum(None)),
                destination: to.to_checksum(None),
                amount: self.value.saturating_to::<u128>(),
                decimals: 18,
                asset: Asset::Native,
            }],
            _ => Vec::new(),
        }
    }

    /// `Transfer` events emitted by the `contract` token.
    pub fn erc20_transfers(&self, contract: &str, decimals: u32) -> Vec<TransferEvent> {
        let Ok(contract_address) = Address::from_str(contract) else {
            return Vec::new();
        };
        let asset = Asset::Erc20 {
            contract: contract.to_string(),
            decimals,
        };

        self.logs
            .iter()
            .filter(|log| log.address == contract_address)
            .filter_map(|log| {
                let (from, to, value) = decode_transfer_log(log)?;
                Some(TransferEvent {
                    source: Some(from.to_checksum(None)),
                    destination: to.to_checksum(None),
                    amount: value.saturating_to::<u128>(),
                    decimals,
                    asset: asset.clone(),
                })
            })
            .collect()
    }
}

/// Decode an ERC-20 `Transfer(address,address,uint256)` log.
fn decode_transfer_log(log: &EvmLog) -> Option<(Address, Address, U256)> {
    if log.topics.len() != 3 || log.topics[0] != Transfer::SIGNATURE_HASH || log.data.len() != 32 {
        return None;
    }
    let from = Address::from_word(log.topics[1]);
    let to = Address::from_word(log.topics[2]);
    let value = U256::from_be_slice(&log.data);
    Some((from, to, value))
}

/// Validate and lowercase a `0x`-prefixed 32-byte transaction hash.
pub(crate) fn normalize_tx_hash(raw: &str) -> Result<String, String> {
    let hex_part = raw
        .strip_prefix("0x")
        .ok_or_else(|| "missing 0x prefix".to_string())?;
    if hex_part.len() != 64 {
        return Err(format!("expected 64 hex characters, got {}", hex_part.len()));
    }
    hex::decode(hex_part).map_err(|e| format!("not hex ({})", e))?;
    Ok(raw.to_ascii_lowercase())
}

/// Whether `address` is a `0x`-prefixed 20-byte hex address.
pub(crate) fn is_valid_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex_part| hex_part.len() == 40 && hex::decode(hex_part).is_ok())
}

/// EVM chain client.
pub struct EvmClient {
    chain: Chain,
    rpc: JsonRpcClient,
    /// Blocks (including the transaction's own) required for `Confirmed`.
    min_confirmations: u64,
}

impl EvmClient {
    /// Create a new client for the EVM chain with `chain_id`.
    pub fn new(
        chain_id: u64,
        rpc_url: impl Into<String>,
        timeout: Duration,
        min_confirmations: u64,
    ) -> Result<Self, ChainError> {
        let rpc = JsonRpcClient::new(rpc_url, timeout)?;
        let chain = Chain::Evm(chain_id);

        info!(
            "Initializing {} client: rpc={}, min_confirmations={}",
            chain,
            rpc.url(),
            min_confirmations
        );

        Ok(Self {
            chain,
            rpc,
            min_confirmations: min_confirmations.max(1),
        })
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let params: Vec<()> = vec![];
        let head: U64 = self.rpc.call_required("eth_blockNumber", params).await?;
        Ok(head.saturating_to::<u64>())
    }

    async fn finalized_block_number(&self) -> Result<Option<u64>, ChainError> {
        let header: Option<BlockHeader> = self
            .rpc
            .call("eth_getBlockByNumber", serde_json::json!(["finalized", false]))
            .await?;
        Ok(header.map(|h| h.number.saturating_to::<u64>()))
    }

    /// Whether a transaction mined in `block` has reached `consistency`.
    async fn is_settled(&self, block: u64, consistency: Consistency) -> Result<bool, ChainError> {
        match consistency {
            Consistency::Confirmed => {
                let head = self.block_number().await?;
                let confirmations = head.saturating_sub(block).saturating_add(1);
                debug!(
                    "Block {} has {} confirmations (head {}, need {})",
                    block, confirmations, head, self.min_confirmations
                );
                Ok(head >= block && confirmations >= self.min_confirmations)
            }
            Consistency::Finalized => {
                let finalized = self.finalized_block_number().await?;
                debug!("Block {} vs finalized {:?}", block, finalized);
                Ok(finalized.is_some_and(|f| block <= f))
            }
        }
    }
}

#[async_trait]
impl ChainClient for EvmClient {
    fn chain(&self) -> Chain {
        self.chain
    }

    #[instrument(skip(self), fields(chain = %self.chain, hash = %reference))]
    async fn get_transaction(
        &self,
        reference: &TransactionReference,
        consistency: Consistency,
    ) -> Result<Option<RawTransactionRecord>, ChainError> {
        let hash = serde_json::json!([reference.as_str()]);

        let Some(tx) = self
            .rpc
            .call::<_, TransactionObject>("eth_getTransactionByHash", &hash)
            .await?
        else {
            debug!("Transaction not found");
            return Ok(None);
        };

        let Some(block_number) = tx.block_number.map(|b| b.saturating_to::<u64>()) else {
            debug!("Transaction is still pending");
            return Ok(None);
        };

        let Some(receipt) = self
            .rpc
            .call::<_, ReceiptObject>("eth_getTransactionReceipt", &hash)
            .await?
        else {
            debug!("Receipt not available yet");
            return Ok(None);
        };

        let receipt_block = receipt.block_number.map(|b| b.saturating_to::<u64>());
        if receipt_block != Some(block_number) {
            debug!(
                "Receipt block {:?} differs from transaction block {}, chain reorganized",
                receipt_block, block_number
            );
            return Ok(None);
        }

        if !self.is_settled(block_number, consistency).await? {
            debug!("Transaction in block {} not yet {:?}", block_number, consistency);
            return Ok(None);
        }

        let succeeded = receipt.status.map_or(true, |s| s == U64::from(1));

        Ok(Some(RawTransactionRecord::Evm(EvmTransaction {
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            block_number,
            succeeded,
            logs: receipt.logs,
        })))
    }

    async fn health_check(&self) -> bool {
        match self.block_number().await {
            Ok(head) => {
                debug!("{} RPC healthy, block: {}", self.chain, head);
                true
            }
            Err(e) => {
                warn!("{} RPC health check failed: {}", self.chain, e);
                false
            }
        }
    }
}
