//! # Service Traits
//!
//! Capability traits for the collaborators the settlement core consumes.
//!
//! The session manager and the orchestrator are polymorphic over these traits:
//! production wires in the RPC client and real wallet adapters, tests wire in mocks.
//!
//! | Trait | Role |
//! |-------|------|
//! | [`WalletSigningProvider`] | holds key material, attaches/detaches, signs |
//! | [`ConnectionClient`] | blockhash, submission and confirmation over RPC |
//! | [`MarketRegistry`] | active + user-added venues, balances, settle instructions |
//! | [`TokenAccountsProvider`] | read-only snapshot of the owner's token accounts |
//! | [`Notifier`] | fire-and-forget user messaging |

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;

use crate::core::error::{Result, WalletError};
use crate::services::accounts::TokenAccount;
use crate::services::markets::{Market, UnsettledBalances};
use crate::services::notify::Notification;
use crate::services::wallet::{ProviderInfo, ProviderKind};

/// A pluggable signer.
///
/// Each concrete adapter implements this explicitly and declares which entry of the
/// closed [`ProviderKind`] table it fulfils.
#[async_trait]
pub trait WalletSigningProvider: Send + Sync {
    /// Which known provider this adapter is.
    fn kind(&self) -> ProviderKind;

    /// Display metadata (name, URL, icon).
    fn info(&self) -> ProviderInfo {
        self.kind().info()
    }

    /// Identity currently exposed by the provider, if attached.
    fn public_key(&self) -> Option<Pubkey>;

    /// The provider's own view of its connection.
    ///
    /// Wallets can drop the connection on their side; the session manager polls this
    /// in [`crate::services::session::WalletSessionManager::refresh`].
    fn is_connected(&self) -> bool {
        self.public_key().is_some()
    }

    /// Attach and return the identity. May wait on user approval indefinitely.
    async fn connect(&self) -> std::result::Result<Pubkey, WalletError>;

    /// Detach.
    async fn disconnect(&self) -> std::result::Result<(), WalletError>;

    /// Sign one transaction. The transaction's message already carries its recent blockhash.
    async fn sign_transaction(&self, transaction: Transaction) -> std::result::Result<Transaction, WalletError>;

    /// Sign a batch in one approval pass.
    ///
    /// Adapters that support batch approval should override this; the default signs
    /// each transaction in order and stops at the first rejection.
    async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> std::result::Result<Vec<Transaction>, WalletError> {
        let mut signed = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            signed.push(self.sign_transaction(transaction).await?);
        }
        Ok(signed)
    }
}

/// Network access. Timeout and retry policy belong to the implementation.
#[async_trait]
pub trait ConnectionClient: Send + Sync {
    /// Recent blockhash to stamp into transactions before signing.
    async fn latest_blockhash(&self) -> Result<Hash>;

    /// Submit a signed transaction and return its signature.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;

    /// Wait until the signature is confirmed.
    async fn confirm_transaction(&self, signature: &Signature) -> Result<()>;
}

/// Source of trading venues and their settle-instruction builders.
#[async_trait]
pub trait MarketRegistry: Send + Sync {
    /// Active plus user-added venues, in display order. `None` while still loading.
    fn markets(&self) -> Option<Vec<Market>>;

    /// Unsettled balances held for `owner` in the venue's open-orders account.
    async fn unsettled_balances(&self, market: &Market, owner: &Pubkey) -> Result<UnsettledBalances>;

    /// Instructions that move the unsettled balances into the given destination accounts.
    async fn settle_instructions(
        &self,
        market: &Market,
        owner: &Pubkey,
        base_destination: &Pubkey,
        quote_destination: &Pubkey,
    ) -> Result<Vec<Instruction>>;
}

/// Discovered token accounts for the connected identity.
pub trait TokenAccountsProvider: Send + Sync {
    /// Latest snapshot, or `None` if accounts have not been loaded yet.
    fn snapshot(&self) -> Option<Arc<Vec<TokenAccount>>>;
}

/// Fire-and-forget user messaging. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
