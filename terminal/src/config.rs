//! # Settlement Configuration
//!
//! Runtime settings loaded from environment variables and validated before use.
//!
//! | Variable | Default | Range |
//! |----------|---------|-------|
//! | `SOLANA_RPC_URL` | `https://api.mainnet-beta.solana.com` | |
//! | `SOLANA_RPC_TIMEOUT_SECS` | `30` | 1-300 |
//! | `SETTLE_MAX_INSTRUCTIONS_PER_TX` | `12` | 1-64 |
//! | `WALLET_PROVIDER` | unset | provider display name |
//! | `WALLET_AUTO_CONNECT` | `false` | flag |
//! | `WALLET_KEYPAIR_PATH` | unset | path |
//!
//! ```rust,no_run
//! use dex_terminal::config::SettleConfig;
//!
//! let config = SettleConfig::from_env()?;
//! println!("RPC: {}", config.rpc_url);
//! # Ok::<(), dex_terminal::config::ConfigError>(())
//! ```

use lib_utils::{get_env_flag, get_env_opt, get_env_parse_or};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::services::settlement::DEFAULT_MAX_INSTRUCTIONS_PER_TX;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] lib_utils::envs::Error),
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Settings for the wallet session and the settlement orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleConfig {
    /// Solana JSON-RPC endpoint
    pub rpc_url: String,
    /// Per-request RPC timeout
    pub rpc_timeout: Duration,
    /// Greedy packing bound for settle transactions
    pub max_instructions_per_tx: usize,
    /// Provider remembered from the last session
    pub wallet_provider: Option<String>,
    /// Attach `wallet_provider` at startup
    pub auto_connect: bool,
    /// Keypair for the keypair-file provider
    pub keypair_path: Option<PathBuf>,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            max_instructions_per_tx: DEFAULT_MAX_INSTRUCTIONS_PER_TX,
            wallet_provider: None,
            auto_connect: false,
            keypair_path: None,
        }
    }
}

impl SettleConfig {
    /// Load and validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            rpc_url: get_env_opt("SOLANA_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            rpc_timeout: Duration::from_secs(get_env_parse_or(
                "SOLANA_RPC_TIMEOUT_SECS",
                DEFAULT_RPC_TIMEOUT_SECS,
            )?),
            max_instructions_per_tx: get_env_parse_or(
                "SETTLE_MAX_INSTRUCTIONS_PER_TX",
                DEFAULT_MAX_INSTRUCTIONS_PER_TX,
            )?,
            wallet_provider: get_env_opt("WALLET_PROVIDER"),
            auto_connect: get_env_flag("WALLET_AUTO_CONNECT", false)?,
            keypair_path: get_env_opt("WALLET_KEYPAIR_PATH").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::Empty("SOLANA_RPC_URL"));
        }
        check_range("SOLANA_RPC_TIMEOUT_SECS", self.rpc_timeout.as_secs(), 1, 300)?;
        check_range(
            "SETTLE_MAX_INSTRUCTIONS_PER_TX",
            self.max_instructions_per_tx as u64,
            1,
            64,
        )?;
        Ok(())
    }
}

fn check_range(name: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange { name, value, min, max });
    }
    Ok(())
}
