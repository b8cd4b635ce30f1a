//! API response types.

use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    pub chains: Vec<ChainHealth>,
}

/// Reachability of one chain's RPC node.
#[derive(Debug, Serialize)]
pub struct ChainHealth {
    pub chain: String,
    pub healthy: bool,
}
