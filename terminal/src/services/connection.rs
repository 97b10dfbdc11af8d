//! # RPC Connection
//!
//! [`ConnectionClient`] over the nonblocking Solana RPC client.
//!
//! The client is created lazily; no request is made until the first call. Timeouts and
//! retries are whatever `solana_client` applies for the configured request timeout.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SettleConfig;
use crate::core::error::{AppError, Result};
use crate::core::service::ConnectionClient;

pub struct RpcConnection {
    rpc: Arc<RpcClient>,
    url: String,
}

impl RpcConnection {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let url = url.into();
        info!(url = %url, timeout_secs = timeout.as_secs(), "Connecting to Solana RPC");
        let rpc = RpcClient::new_with_timeout(url.clone(), timeout);
        Self {
            rpc: Arc::new(rpc),
            url,
        }
    }

    pub fn from_config(config: &SettleConfig) -> Self {
        Self::new(config.rpc_url.clone(), config.rpc_timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ConnectionClient for RpcConnection {
    async fn latest_blockhash(&self) -> Result<Hash> {
        self.rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| AppError::Rpc(format!("Failed to get recent blockhash: {}", e)))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let signature = self.rpc.send_transaction(transaction).await.map_err(|e| {
            warn!(error = %e, "Transaction submission failed");
            AppError::Rpc(e.to_string())
        })?;
        debug!(%signature, "Transaction submitted");
        Ok(signature)
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<()> {
        self.rpc
            .poll_for_signature(signature)
            .await
            .map_err(|e| AppError::Rpc(format!("Transaction {} not confirmed: {}", signature, e)))?;
        debug!(%signature, "Transaction confirmed");
        Ok(())
    }
}
