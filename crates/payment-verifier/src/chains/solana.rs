//! Solana chain client.
//!
//! Fetches transactions over JSON-RPC and decodes native SOL transfers made
//! through the System Program.

use super::rpc::JsonRpcClient;
use super::{ChainClient, RawTransactionRecord};
use crate::error::ChainError;
use crate::types::{Asset, Chain, Consistency, TransactionReference, TransferEvent};
use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Signature, system_program};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// `SystemInstruction::Transfer` discriminant in the bincode encoding.
const SYSTEM_TRANSFER_TAG: u32 = 2;

/// Encoded length of a `Transfer` instruction: u32 tag + u64 lamports.
const SYSTEM_TRANSFER_LEN: usize = 12;

// RPC response structures - some fields unused but required for deserialization
#[allow(dead_code)]
mod rpc_types {
    use serde::Deserialize;

    /// Transaction response from getTransaction.
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionResponse {
        pub slot: u64,
        pub transaction: TransactionData,
        pub meta: Option<TransactionMeta>,
        pub block_time: Option<i64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct TransactionData {
        pub message: TransactionMessage,
        pub signatures: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionMessage {
        pub account_keys: Vec<String>,
        pub instructions: Vec<InstructionData>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InstructionData {
        pub program_id_index: u8,
        pub accounts: Vec<u8>,
        pub data: String, // base58 encoded
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionMeta {
        pub err: Option<serde_json::Value>,
        pub fee: u64,
        pub loaded_addresses: Option<LoadedAddresses>,
    }

    /// Accounts pulled in through address lookup tables (v0 transactions).
    #[derive(Debug, Default, Deserialize)]
    pub struct LoadedAddresses {
        #[serde(default)]
        pub writable: Vec<String>,
        #[serde(default)]
        pub readonly: Vec<String>,
    }
}

use rpc_types::*;

/// A compiled instruction with its data already base58-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolanaInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

/// A settled Solana transaction as returned by `getTransaction`.
#[derive(Debug, Clone)]
pub struct SolanaTransaction {
    pub signature: String,
    pub slot: u64,
    /// Static account keys followed by loaded writable, then loaded readonly addresses.
    pub account_keys: Vec<String>,
    pub instructions: Vec<SolanaInstruction>,
    /// `meta.err` as reported by the node.
    pub error: Option<serde_json::Value>,
}

impl SolanaTransaction {
    fn from_response(signature: &str, response: TransactionResponse) -> Result<Self, ChainError> {
        let error = match &response.meta {
            Some(meta) => meta.err.clone(),
            None => Some(serde_json::Value::String(
                "transaction metadata unavailable".to_string(),
            )),
        };

        let mut account_keys = response.transaction.message.account_keys;
        if let Some(loaded) = response.meta.and_then(|m| m.loaded_addresses) {
            account_keys.extend(loaded.writable);
            account_keys.extend(loaded.readonly);
        }

        let instructions = response
            .transaction
            .message
            .instructions
            .into_iter()
            .map(|ix| {
                let data = bs58::decode(&ix.data).into_vec().map_err(|e| {
                    ChainError::Decode(format!("Invalid instruction data in {}: {}", signature, e))
                })?;
                Ok(SolanaInstruction {
                    program_id_index: ix.program_id_index,
                    accounts: ix.accounts,
                    data,
                })
            })
            .collect::<Result<Vec<_>, ChainError>>()?;

        Ok(Self {
            signature: signature.to_string(),
            slot: response.slot,
            account_keys,
            instructions,
            error,
        })
    }

    /// Execution error, if the transaction failed.
    pub fn failure(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    /// Native SOL transfers made by top-level System Program instructions.
    ///
    /// Instructions of any other program are ignored.
    pub fn native_transfers(&self) -> Vec<TransferEvent> {
        let system_program_id = system_program::id().to_string();

        self.instructions
            .iter()
            .filter(|ix| {
                self.account_keys.get(ix.program_id_index as usize) == Some(&system_program_id)
            })
            .filter_map(|ix| {
                let lamports = decode_system_transfer(&ix.data)?;
                let source = ix
                    .accounts
                    .first()
                    .and_then(|i| self.account_keys.get(*i as usize))
                    .cloned();
                let destination = ix
                    .accounts
                    .get(1)
                    .and_then(|i| self.account_keys.get(*i as usize))
                    .cloned()?;

                Some(TransferEvent {
                    source,
                    destination,
                    amount: u128::from(lamports),
                    decimals: Chain::Solana.native_decimals(),
                    asset: Asset::Native,
                })
            })
            .collect()
    }
}

/// Decode a `SystemInstruction::Transfer`, returning the lamports moved.
fn decode_system_transfer(data: &[u8]) -> Option<u64> {
    if data.len() != SYSTEM_TRANSFER_LEN {
        return None;
    }
    let tag = u32::from_le_bytes(data[..4].try_into().ok()?);
    if tag != SYSTEM_TRANSFER_TAG {
        return None;
    }
    Some(u64::from_le_bytes(data[4..].try_into().ok()?))
}

/// Validate a base58 transaction signature.
pub(crate) fn normalize_signature(raw: &str) -> Result<String, String> {
    Signature::from_str(raw)
        .map(|_| raw.to_string())
        .map_err(|e| format!("not a base58 signature ({})", e))
}

/// Whether `address` parses as a Solana public key.
pub(crate) fn is_valid_address(address: &str) -> bool {
    Pubkey::from_str(address).is_ok()
}

/// Solana chain client.
pub struct SolanaClient {
    rpc: JsonRpcClient,
}

impl SolanaClient {
    /// Create a new Solana client for the given RPC endpoint.
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let rpc = JsonRpcClient::new(rpc_url, timeout)?;
        info!("Initializing Solana client: rpc={}", rpc.url());
        Ok(Self { rpc })
    }
}

#[async_trait]
impl ChainClient for SolanaClient {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    #[instrument(skip(self), fields(signature = %reference))]
    async fn get_transaction(
        &self,
        reference: &TransactionReference,
        consistency: Consistency,
    ) -> Result<Option<RawTransactionRecord>, ChainError> {
        let params = serde_json::json!([
            reference.as_str(),
            {
                "encoding": "json",
                "commitment": consistency.as_commitment(),
                "maxSupportedTransactionVersion": 0
            }
        ]);

        let response: Option<TransactionResponse> =
            self.rpc.call("getTransaction", params).await?;

        match response {
            Some(response) => {
                let tx = SolanaTransaction::from_response(reference.as_str(), response)?;
                debug!(
                    "Fetched Solana transaction at slot {} ({} instructions)",
                    tx.slot,
                    tx.instructions.len()
                );
                Ok(Some(RawTransactionRecord::Solana(tx)))
            }
            None => {
                debug!("Solana transaction not found at {:?} commitment", consistency);
                Ok(None)
            }
        }
    }

    async fn health_check(&self) -> bool {
        let params: Vec<()> = vec![];
        match self.rpc.call::<_, u64>("getSlot", params).await {
            Ok(Some(slot)) => {
                debug!("Solana RPC healthy, slot: {}", slot);
                true
            }
            Ok(None) => {
                warn!("Solana RPC health check returned no slot");
                false
            }
            Err(e) => {
                warn!("Solana RPC health check failed: {}", e);
                false
            }
        }
    }
}
