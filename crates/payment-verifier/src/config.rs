//! Payment verification configuration.

use crate::types::{Chain, Consistency};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Main verifier configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentVerifierConfig {
    /// Upper bound for one transaction lookup.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Commitment a transaction must reach before it counts.
    #[serde(default)]
    pub consistency: Consistency,

    /// Blocks required on EVM chains for `confirmed` (1 = included).
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u64,

    /// Accepted deviation from the plan amount, in native units.
    #[serde(default)]
    pub tolerance: Decimal,

    /// Solana configuration.
    pub solana: Option<SolanaChainConfig>,

    /// Ethereum mainnet configuration.
    pub ethereum: Option<EvmChainConfig>,

    /// Base configuration.
    pub base: Option<EvmChainConfig>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_min_confirmations() -> u64 {
    1
}

impl Default for PaymentVerifierConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            consistency: Consistency::default(),
            min_confirmations: default_min_confirmations(),
            tolerance: Decimal::ZERO,
            solana: None,
            ethereum: None,
            base: None,
        }
    }
}

impl PaymentVerifierConfig {
    /// Get enabled chains.
    pub fn enabled_chains(&self) -> Vec<Chain> {
        let mut chains = Vec::new();
        if self.ethereum.as_ref().is_some_and(|c| c.enabled) {
            chains.push(Chain::ETHEREUM);
        }
        if self.base.as_ref().is_some_and(|c| c.enabled) {
            chains.push(Chain::BASE);
        }
        if self.solana.as_ref().is_some_and(|c| c.enabled) {
            chains.push(Chain::Solana);
        }
        chains
    }

    /// Wallet that receives payments on `chain`, if configured.
    pub fn receiving_address(&self, chain: Chain) -> Option<&str> {
        let address = match chain {
            Chain::Solana => self.solana.as_ref()?.receiving_address.as_deref(),
            Chain::ETHEREUM => self.ethereum.as_ref()?.receiving_address.as_deref(),
            Chain::BASE => self.base.as_ref()?.receiving_address.as_deref(),
            Chain::Evm(_) => None,
        };
        address.filter(|a| !a.is_empty())
    }
}

/// Solana chain configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaChainConfig {
    #[serde(default = "default_chain_enabled")]
    pub enabled: bool,

    #[serde(default = "default_solana_rpc")]
    pub rpc_url: String,

    /// Wallet that receives SOL payments.
    pub receiving_address: Option<String>,
}

/// EVM chain configuration (Ethereum, Base).
#[derive(Debug, Clone, Deserialize)]
pub struct EvmChainConfig {
    #[serde(default = "default_chain_enabled")]
    pub enabled: bool,

    /// JSON-RPC endpoint; falls back to a public node for known chains.
    pub rpc_url: Option<String>,

    /// Wallet that receives ETH payments.
    pub receiving_address: Option<String>,
}

impl EvmChainConfig {
    /// The configured RPC endpoint, or the public default for `chain`.
    pub fn rpc_url_for(&self, chain: Chain) -> Option<String> {
        self.rpc_url.clone().or_else(|| match chain {
            Chain::ETHEREUM => Some("https://ethereum-rpc.publicnode.com".to_string()),
            Chain::BASE => Some("https://mainnet.base.org".to_string()),
            _ => None,
        })
    }
}

fn default_chain_enabled() -> bool {
    true
}

fn default_solana_rpc() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}
