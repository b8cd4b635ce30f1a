//! Core types for payment verification.

use crate::units;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported blockchain networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Chain {
    /// Solana mainnet.
    Solana,
    /// An EVM-compatible chain, identified by its chain id.
    Evm(u64),
}

impl Chain {
    /// Ethereum mainnet.
    pub const ETHEREUM: Chain = Chain::Evm(1);
    /// Base L2.
    pub const BASE: Chain = Chain::Evm(8453);

    /// Decimal scale of the chain's native asset (lamports, wei).
    pub fn native_decimals(&self) -> u32 {
        match self {
            Chain::Solana => 9,
            Chain::Evm(_) => 18,
        }
    }

    /// Ticker of the chain's native asset.
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Solana => "SOL",
            Chain::Evm(_) => "ETH",
        }
    }

    /// Machine-readable name, the inverse of [`Chain::from_str`].
    pub fn slug(&self) -> String {
        match *self {
            Chain::Solana => "solana".to_string(),
            Chain::ETHEREUM => "ethereum".to_string(),
            Chain::BASE => "base".to_string(),
            Chain::Evm(id) => format!("evm:{}", id),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Chain::Solana => write!(f, "Solana"),
            Chain::ETHEREUM => write!(f, "Ethereum"),
            Chain::BASE => write!(f, "Base"),
            Chain::Evm(id) => write!(f, "EVM({})", id),
        }
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "solana" => Ok(Chain::Solana),
            "ethereum" => Ok(Chain::ETHEREUM),
            "base" => Ok(Chain::BASE),
            other => other
                .strip_prefix("evm:")
                .and_then(|id| id.parse::<u64>().ok())
                .map(Chain::Evm)
                .ok_or_else(|| format!("Unknown chain: {}", s)),
        }
    }
}

impl TryFrom<String> for Chain {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Chain> for String {
    fn from(chain: Chain) -> Self {
        chain.slug()
    }
}

/// Which asset a payment is expected in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Asset {
    /// The chain's base asset (SOL, ETH).
    #[default]
    Native,
    /// An ERC-20 token on an EVM chain.
    Erc20 { contract: String, decimals: u32 },
}

impl Asset {
    /// Decimal scale of this asset on the given chain.
    pub fn decimals(&self, chain: Chain) -> u32 {
        match self {
            Asset::Native => chain.native_decimals(),
            Asset::Erc20 { decimals, .. } => *decimals,
        }
    }
}

/// Commitment a transaction must have reached before it counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    /// Voted on by a supermajority (Solana) / included with enough confirmations (EVM).
    #[default]
    Confirmed,
    /// Rooted (Solana) / at or below the `finalized` block tag (EVM).
    Finalized,
}

impl Consistency {
    /// Solana commitment level name.
    pub fn as_commitment(&self) -> &'static str {
        match self {
            Consistency::Confirmed => "confirmed",
            Consistency::Finalized => "finalized",
        }
    }
}

/// A syntactically validated transaction reference.
///
/// Build one with [`TransactionReference::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionReference {
    chain: Chain,
    value: String,
}

impl TransactionReference {
    pub(crate) fn new_unchecked(chain: Chain, value: String) -> Self {
        Self { chain, value }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for TransactionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A value movement decoded from a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferEvent {
    /// Sending account, when the encoding exposes it.
    pub source: Option<String>,
    /// Receiving account.
    pub destination: String,
    /// Amount in the asset's smallest unit.
    pub amount: u128,
    /// Decimal scale of `amount`.
    pub decimals: u32,
    pub asset: Asset,
}

impl TransferEvent {
    /// Human-readable amount, if it fits a `Decimal`.
    pub fn amount_decimal(&self) -> Option<Decimal> {
        units::to_decimal(self.amount, self.decimals)
    }
}

/// A request to check one transaction against one expected payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub chain: Chain,
    /// Raw reference as supplied by the user.
    pub reference: String,
    pub expected_destination: String,
    /// Expected amount in human units (SOL, ETH, tokens).
    pub expected_amount: Decimal,
    /// Accepted deviation from `expected_amount`, in human units.
    #[serde(default)]
    pub tolerance: Decimal,
    #[serde(default)]
    pub asset: Asset,
}

impl VerificationRequest {
    /// Create an exact-match request for the chain's native asset.
    pub fn new(
        chain: Chain,
        reference: impl Into<String>,
        expected_destination: impl Into<String>,
        expected_amount: Decimal,
    ) -> Self {
        Self {
            chain,
            reference: reference.into(),
            expected_destination: expected_destination.into(),
            expected_amount,
            tolerance: Decimal::ZERO,
            asset: Asset::Native,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.asset = asset;
        self
    }
}

/// Why a verification could not reach a positive or negative verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The reference does not match the chain's syntax. Permanent.
    MalformedReference(String),
    /// The transaction executed and failed/reverted. Permanent.
    TransactionFailed(String),
    /// RPC or network failure. Transient.
    Transport(String),
    /// The node did not answer in time. Transient.
    Timeout,
    /// No chain client is configured for the chain.
    UnsupportedChain(Chain),
    /// The asset cannot be verified on this chain.
    UnsupportedAsset(String),
    /// The expected amount or tolerance is unusable.
    InvalidAmount(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MalformedReference(r) => write!(f, "malformed reference: {}", r),
            FailureReason::TransactionFailed(r) => write!(f, "transaction reverted/failed: {}", r),
            FailureReason::Transport(r) => write!(f, "transport failure: {}", r),
            FailureReason::Timeout => write!(f, "timeout"),
            FailureReason::UnsupportedChain(c) => write!(f, "chain not supported: {}", c),
            FailureReason::UnsupportedAsset(r) => write!(f, "asset not supported: {}", r),
            FailureReason::InvalidAmount(r) => write!(f, "invalid amount: {}", r),
        }
    }
}

/// Outcome of [`PaymentVerifier::verify`](crate::PaymentVerifier::verify).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum VerificationResult {
    /// A matching transfer exists in a successful, settled transaction.
    Valid(TransferEvent),
    /// The ledger has no settled transaction for the reference (yet).
    NotFound,
    Failed(FailureReason),
    /// The transaction exists and succeeded, but pays someone else or another amount.
    NoMatchingTransfer,
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid(_))
    }

    /// Whether resubmitting the same request after a backoff may help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VerificationResult::Failed(FailureReason::Transport(_) | FailureReason::Timeout)
        )
    }

    /// `NotFound` can turn into `Valid` once the transaction settles.
    pub fn may_settle_later(&self) -> bool {
        matches!(self, VerificationResult::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_parse_and_display() {
        assert_eq!("solana".parse::<Chain>().unwrap(), Chain::Solana);
        assert_eq!("Ethereum".parse::<Chain>().unwrap(), Chain::ETHEREUM);
        assert_eq!("base".parse::<Chain>().unwrap(), Chain::BASE);
        assert_eq!("evm:137".parse::<Chain>().unwrap(), Chain::Evm(137));
        assert!("dogecoin".parse::<Chain>().is_err());

        assert_eq!(Chain::BASE.to_string(), "Base");
        assert_eq!(Chain::Evm(137).to_string(), "EVM(137)");
        assert_eq!(Chain::Evm(137).slug(), "evm:137");
    }

    #[test]
    fn test_chain_serde_uses_slug() {
        let json = serde_json::to_string(&Chain::BASE).unwrap();
        assert_eq!(json, "\"base\"");

        let chain: Chain = serde_json::from_str("\"solana\"").unwrap();
        assert_eq!(chain, Chain::Solana);
    }

    #[test]
    fn test_native_decimals() {
        assert_eq!(Chain::Solana.native_decimals(), 9);
        assert_eq!(Chain::ETHEREUM.native_decimals(), 18);
        assert_eq!(Asset::Native.decimals(Chain::Solana), 9);

        let usdc = Asset::Erc20 {
            contract: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into(),
            decimals: 6,
        };
        assert_eq!(usdc.decimals(Chain::BASE), 6);
    }

    #[test]
    fn test_request_builder_defaults() {
        let request = VerificationRequest::new(Chain::Solana, "sig", "wallet", Decimal::TEN);
        assert_eq!(request.tolerance, Decimal::ZERO);
        assert_eq!(request.asset, Asset::Native);

        let request = request.with_tolerance(Decimal::new(1, 9));
        assert_eq!(request.tolerance, Decimal::new(1, 9));
    }

    #[test]
    fn test_result_classification() {
        assert!(VerificationResult::Failed(FailureReason::Timeout).is_retryable());
        assert!(VerificationResult::Failed(FailureReason::Transport("down".into())).is_retryable());
        assert!(!VerificationResult::Failed(FailureReason::TransactionFailed("x".into())).is_retryable());
        assert!(!VerificationResult::NoMatchingTransfer.is_retryable());
        assert!(VerificationResult::NotFound.may_settle_later());
        assert!(!VerificationResult::NotFound.is_retryable());
    }

    #[test]
    fn test_consistency_commitment_names() {
        assert_eq!(Consistency::default(), Consistency::Confirmed);
        assert_eq!(Consistency::Finalized.as_commitment(), "finalized");
    }
}
