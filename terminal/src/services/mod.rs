//! # Services Module
//!
//! The wallet session, destination-account selection and the settlement orchestrator,
//! plus the concrete collaborators the crate ships.
//!
//! ## Module Overview
//!
//! ```text
//! services/
//! ├── wallet.rs      - Provider table and keypair-file signer
//! ├── session.rs     - WalletSessionManager (connect/disconnect, edge events)
//! ├── accounts.rs    - Token account snapshot
//! ├── selection.rs   - Per-mint destination account bindings
//! ├── markets.rs     - Venue descriptors and unsettled balances
//! ├── balances.rs    - Per-asset wallet balance rows
//! ├── settlement.rs  - SettlementOrchestrator
//! ├── connection.rs  - Solana RPC ConnectionClient
//! └── notify.rs      - Notification type and notifiers
//! ```
//!
//! ## Settle Flow
//!
//! ```text
//!   "Settle all funds"
//!          │
//!          ▼
//! ┌──────────────────────────┐  connected_identity  ┌──────────────────────┐
//! │  SettlementOrchestrator  ├─────────────────────▶│ WalletSessionManager │
//! │                          │  sign_transactions   │ (owns the provider)  │
//! │                          ├─────────────────────▶│                      │
//! └────┬──────────────┬──────┘                      └──────────────────────┘
//!      │              │ selected_in(mint)
//!      │              ▼
//!      │   ┌────────────────────────────┐
//!      │   │ TokenAccountSelectionStore │
//!      │   └────────────────────────────┘
//!      │ balances, instructions, send, confirm
//!      ▼
//! MarketRegistry + ConnectionClient
//! ```
//!
//! ## Thread Safety
//!
//! Every service is `Send + Sync` and shared by `Arc`. State lives behind
//! `parking_lot` locks that are released before any `.await`.

pub mod accounts;
pub mod balances;
pub mod connection;
pub mod markets;
pub mod notify;
pub mod selection;
pub mod session;
pub mod settlement;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

use solana_sdk::pubkey::Pubkey;

/// Serialize a public key as its base58 string.
pub(crate) fn serialize_pubkey<S: serde::Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

/// Serialize an optional public key as base58, or `null`.
pub(crate) fn serialize_optional_pubkey<S: serde::Serializer>(
    key: &Option<Pubkey>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match key {
        Some(key) => serializer.collect_str(key),
        None => serializer.serialize_none(),
    }
}
