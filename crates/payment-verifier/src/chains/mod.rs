//! Chain adapters and per-chain rules.
//!
//! Each supported chain family provides a [`ChainClient`] that fetches a
//! settled transaction record, and a decoder that turns that record into
//! [`TransferEvent`]s. Chain-specific syntax rules (addresses, references)
//! are selected by matching on [`Chain`].

pub mod evm;
mod rpc;
pub mod solana;

pub use evm::{EvmClient, EvmLog, EvmTransaction};
pub use solana::{SolanaClient, SolanaInstruction, SolanaTransaction};

use crate::error::{ChainError, ReferenceError};
use crate::types::{Asset, Chain, Consistency, TransactionReference, TransferEvent};
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// A chain node's answer for one transaction, already decoded per chain family.
#[derive(Debug, Clone)]
pub enum RawTransactionRecord {
    Solana(SolanaTransaction),
    Evm(EvmTransaction),
}

impl RawTransactionRecord {
    /// Execution failure reported by the ledger, if any.
    pub fn failure(&self) -> Option<String> {
        match self {
            RawTransactionRecord::Solana(tx) => tx.failure(),
            RawTransactionRecord::Evm(tx) => tx.failure(),
        }
    }

    /// Decode the value transfers of `asset` contained in this record.
    pub fn decode_transfers(&self, asset: &Asset) -> Vec<TransferEvent> {
        match self {
            RawTransactionRecord::Solana(tx) => match asset {
                Asset::Native => tx.native_transfers(),
                // SPL-token transfers are not decoded.
                Asset::Erc20 { .. } => Vec::new(),
            },
            RawTransactionRecord::Evm(tx) => match asset {
                Asset::Native => tx.native_transfers(),
                Asset::Erc20 { contract, decimals } => tx.erc20_transfers(contract, *decimals),
            },
        }
    }
}

/// Thin adapter over one chain's RPC endpoint.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The chain this client talks to.
    fn chain(&self) -> Chain;

    /// Fetch a transaction that has reached `consistency`.
    ///
    /// Returns `Ok(None)` when the ledger has no such transaction or it has
    /// not settled yet. Transport problems are `Err`, never `Ok(None)`.
    async fn get_transaction(
        &self,
        reference: &TransactionReference,
        consistency: Consistency,
    ) -> Result<Option<RawTransactionRecord>, ChainError>;

    /// Check if the node is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

impl TransactionReference {
    /// Validate a raw reference against the chain's syntax.
    pub fn parse(chain: Chain, raw: &str) -> Result<Self, ReferenceError> {
        let normalized = match chain {
            Chain::Solana => solana::normalize_signature(raw),
            Chain::Evm(_) => evm::normalize_tx_hash(raw),
        };

        normalized
            .map(|value| TransactionReference::new_unchecked(chain, value))
            .map_err(|reason| ReferenceError { chain, reason })
    }
}

impl Chain {
    /// Whether `address` is a well-formed account address on this chain.
    pub fn validate_address(&self, address: &str) -> bool {
        match self {
            Chain::Solana => solana::is_valid_address(address),
            Chain::Evm(_) => evm::is_valid_address(address),
        }
    }

    /// Compare two addresses under this chain's rules.
    ///
    /// EVM hex addresses compare case-insensitively; Solana base58 is case-sensitive.
    pub fn addresses_match(&self, a: &str, b: &str) -> bool {
        match self {
            Chain::Solana => a == b,
            Chain::Evm(_) => a.eq_ignore_ascii_case(b),
        }
    }

    /// Whether payments in `asset` can be verified on this chain.
    pub fn supports_asset(&self, asset: &Asset) -> bool {
        match (self, asset) {
            (_, Asset::Native) => true,
            (Chain::Evm(_), Asset::Erc20 { contract, .. }) => self.validate_address(contract),
            (Chain::Solana, Asset::Erc20 { .. }) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sol_sig() -> String {
        bs58::encode([7u8; 64]).into_string()
    }

    #[test]
    fn test_parse_solana_reference() {
        let sig = sol_sig();
        let reference = TransactionReference::parse(Chain::Solana, &sig).unwrap();
        assert_eq!(reference.as_str(), sig);
        assert_eq!(reference.chain(), Chain::Solana);

        assert!(TransactionReference::parse(Chain::Solana, "not-a-hash").is_err());
        assert!(TransactionReference::parse(Chain::Solana, "").is_err());
    }

    #[test]
    fn test_parse_evm_reference_normalizes_case() {
        let raw = format!("0x{}", "AB".repeat(32));
        let reference = TransactionReference::parse(Chain::ETHEREUM, &raw).unwrap();
        assert_eq!(reference.as_str(), format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn test_parse_evm_reference_rejects_bad_input() {
        assert!(TransactionReference::parse(Chain::BASE, "not-a-hash").is_err());
        assert!(TransactionReference::parse(Chain::BASE, &"ab".repeat(32)).is_err());
        assert!(TransactionReference::parse(Chain::BASE, &format!("0x{}", "ab".repeat(31))).is_err());
        assert!(TransactionReference::parse(Chain::BASE, &format!("0x{}", "zz".repeat(32))).is_err());
        // A Solana signature is not an EVM hash.
        assert!(TransactionReference::parse(Chain::BASE, &sol_sig()).is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(Chain::Solana.validate_address("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"));
        assert!(!Chain::Solana.validate_address("invalid"));

        assert!(Chain::ETHEREUM.validate_address("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"));
        assert!(!Chain::ETHEREUM.validate_address("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"));
        assert!(!Chain::ETHEREUM.validate_address("0x1234"));
    }

    #[test]
    fn test_addresses_match_rules() {
        assert!(Chain::BASE.addresses_match(
            "0xABCDEF0000000000000000000000000000000001",
            "0xabcdef0000000000000000000000000000000001"
        ));
        assert!(!Chain::Solana.addresses_match(
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "epjfwdd5aufqssqem2qn1xzybapc8g4wegGkzwytdt1v"
        ));
    }

    #[test]
    fn test_supports_asset() {
        let token = Asset::Erc20 {
            contract: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into(),
            decimals: 6,
        };
        assert!(Chain::BASE.supports_asset(&token));
        assert!(!Chain::Solana.supports_asset(&token));
        assert!(Chain::Solana.supports_asset(&Asset::Native));
    }
}
