//! # Token Accounts
//!
//! Ledger-account snapshots for the connected identity.
//!
//! Discovery happens outside this crate (RPC polling, websocket subscriptions).
//! Whatever does the discovery publishes a full list into [`TokenAccountsSnapshot`];
//! readers take an `Arc` to the current list and never observe a partial refresh.

use parking_lot::RwLock;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::debug;

use crate::core::service::TokenAccountsProvider;

/// One on-chain token account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAccount {
    /// Account address
    #[serde(serialize_with = "crate::services::serialize_pubkey")]
    pub address: Pubkey,
    /// Owning identity
    #[serde(serialize_with = "crate::services::serialize_pubkey")]
    pub owner: Pubkey,
    /// Asset held by the account
    #[serde(serialize_with = "crate::services::serialize_pubkey")]
    pub mint: Pubkey,
    /// Raw amount in the mint's smallest unit
    pub balance: u64,
}

/// In-memory [`TokenAccountsProvider`] refreshed by the embedding application.
#[derive(Default)]
pub struct TokenAccountsSnapshot {
    accounts: RwLock<Option<Arc<Vec<TokenAccount>>>>,
}

impl TokenAccountsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a snapshot that is already loaded.
    pub fn loaded(accounts: Vec<TokenAccount>) -> Self {
        let snapshot = Self::new();
        snapshot.replace(accounts);
        snapshot
    }

    /// Publish a fresh account list.
    pub fn replace(&self, accounts: Vec<TokenAccount>) {
        debug!(count = accounts.len(), "Token accounts refreshed");
        *self.accounts.write() = Some(Arc::new(accounts));
    }

    /// Forget the current list, e.g. when the wallet disconnects.
    pub fn clear(&self) {
        *self.accounts.write() = None;
    }
}

impl TokenAccountsProvider for TokenAccountsSnapshot {
    fn snapshot(&self) -> Option<Arc<Vec<TokenAccount>>> {
        self.accounts.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_lifecycle() {
        let snapshot = TokenAccountsSnapshot::new();
        assert!(snapshot.snapshot().is_none());

        let account = TokenAccount {
            address: Pubkey::new_from_array([1; 32]),
            owner: Pubkey::new_from_array([2; 32]),
            mint: Pubkey::new_from_array([3; 32]),
            balance: 10,
        };
        snapshot.replace(vec![account.clone()]);
        let held = snapshot.snapshot().expect("loaded");
        assert_eq!(held.as_slice(), &[account]);

        // readers keep their Arc across a refresh
        snapshot.replace(Vec::new());
        assert_eq!(held.len(), 1);
        assert_eq!(snapshot.snapshot().map(|a| a.len()), Some(0));

        snapshot.clear();
        assert!(snapshot.snapshot().is_none());
    }
}
