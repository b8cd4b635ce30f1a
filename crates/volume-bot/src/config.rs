//! Application configuration loaded from environment variables.
//!
//! Keys use `__` as the section separator, e.g.
//! `VERIFIER__SOLANA__RECEIVING_ADDRESS` or `SESSION__TTL=30m`.

use anyhow::{Context, Result};
use payment_verifier::{Chain, PaymentVerifierConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,

    /// Payment verification and per-chain wallets
    #[serde(default)]
    pub verifier: PaymentVerifierConfig,

    /// Wizard session storage
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Support handle shown to users, without the leading `@`
    #[serde(default = "default_support_contact")]
    pub support_contact: String,

    /// Webhook listen port
    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// How long an idle wizard session is kept
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            support_contact: default_support_contact(),
            server_port: default_server_port(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl: default_ttl() }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_support_contact() -> String {
    "multibumpersupport".into()
}

fn default_server_port() -> u16 {
    8080
}

fn default_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60) // 24 hours
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Wallet addresses are strings; never coerce them to numbers.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Receiving wallet per enabled chain.
    pub fn receiving_wallets(&self) -> HashMap<Chain, String> {
        self.verifier
            .enabled_chains()
            .into_iter()
            .filter_map(|chain| {
                self.verifier
                    .receiving_address(chain)
                    .map(|address| (chain, address.to_string()))
            })
            .collect()
    }
}
