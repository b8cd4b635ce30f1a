//! On-chain payment verification for the volume boost bot
//!
//! Given a chain, a transaction reference, an expected recipient and an
//! expected amount, [`PaymentVerifier`] decides whether the transaction is a
//! valid payment.
//!
//! # Architecture
//!
//! ```text
//! VerificationRequest → parse reference → ChainClient (JSON-RPC) → decode transfers → match
//! ```
//!
//! # Modules
//!
//! - [`chains`] - Solana and EVM clients, transfer decoding, per-chain rules
//! - [`config`] - Verifier configuration
//! - [`types`] - Chains, requests and verdicts
//! - [`units`] - Decimal / smallest-unit conversion
//! - [`verifier`] - The verification algorithm
//!
//! # Verdicts
//!
//! `verify` never returns an error. `NotFound` may turn into `Valid` once the
//! transaction settles; `Failed(Transport | Timeout)` is worth retrying after a
//! backoff; everything else is permanent.

pub mod chains;
pub mod config;
pub mod error;
pub mod types;
pub mod units;
pub mod verifier;

// Re-exports for convenience
pub use chains::{ChainClient, EvmClient, RawTransactionRecord, SolanaClient};
pub use config::{EvmChainConfig, PaymentVerifierConfig, SolanaChainConfig};
pub use error::{ChainError, ReferenceError, UnitsError};
pub use types::{
    Asset, Chain, Consistency, FailureReason, TransactionReference, TransferEvent,
    VerificationRequest, VerificationResult,
};
pub use verifier::{find_matching_transfer, PaymentVerifier};
