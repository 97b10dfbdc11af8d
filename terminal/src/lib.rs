//! # DEX Terminal - Settlement Core
//!
//! Wallet session lifecycle and multi-market fund settlement for a Solana DEX trading
//! terminal.
//!
//! ## Features
//!
//! - **Wallet Session**: one attached signing provider at a time, with connect and
//!   disconnect notifications that fire once per transition
//! - **Destination Accounts**: per-mint selection of the token account that receives
//!   settled funds, with a deterministic default
//! - **Settle All Funds**: moves unsettled balances out of every venue in one action,
//!   one approval pass, per-venue outcomes
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              dex-terminal (this crate)                 │
//! ├────────────────────────────────────────────────────────┤
//! │  services::session     - WalletSessionManager          │
//! │  services::selection   - TokenAccountSelectionStore    │
//! │  services::settlement  - SettlementOrchestrator        │
//! │  core::service         - collaborator traits           │
//! └────────────────────────────────────────────────────────┘
//!          │                              │
//!          │ WalletSigningProvider        │ Solana RPC
//!          ▼                              ▼
//! ┌─────────────────┐          ┌─────────────────────────┐
//! │ Wallet adapters │          │   Solana Network        │
//! │ (keypair, ...)  │          │   (Devnet/Mainnet)      │
//! └─────────────────┘          └─────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - **core**: `AppError`, `Result<T>` and the collaborator traits
//! - **config**: `SettleConfig` loaded from the environment
//! - **debug**: `tracing` subscriber setup
//! - **services**: session, selection, settlement and the shipped collaborators
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dex_terminal::config::SettleConfig;
//! use dex_terminal::core::service::MarketRegistry;
//! use dex_terminal::services::{
//!     accounts::TokenAccountsSnapshot,
//!     connection::RpcConnection,
//!     notify::TracingNotifier,
//!     selection::TokenAccountSelectionStore,
//!     session::WalletSessionManager,
//!     settlement::SettlementOrchestrator,
//!     wallet::{KeypairWallet, ProviderKind, ProviderTable},
//! };
//! use std::sync::Arc;
//!
//! # async fn run(markets: Arc<dyn MarketRegistry>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SettleConfig::from_env()?;
//! let notifier = Arc::new(TracingNotifier);
//!
//! let mut providers = ProviderTable::new();
//! if let Some(path) = &config.keypair_path {
//!     providers.register(Arc::new(KeypairWallet::from_file(path)?));
//! }
//! let session = Arc::new(WalletSessionManager::new(providers, notifier.clone()));
//! session.connect(ProviderKind::KeypairFile).await?;
//!
//! let accounts = Arc::new(TokenAccountsSnapshot::new());
//! let selections = Arc::new(TokenAccountSelectionStore::new(accounts.clone()));
//! let orchestrator = Arc::new(
//!     SettlementOrchestrator::new(
//!         session,
//!         markets,
//!         accounts,
//!         selections,
//!         Arc::new(RpcConnection::from_config(&config)),
//!         notifier,
//!     )
//!     .with_max_instructions_per_tx(config.max_instructions_per_tx),
//! );
//!
//! let report = orchestrator.spawn_settle_all().await??;
//! println!("{} venues settled", report.summary.settled);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test -p dex-terminal
//! ```

pub mod config;
pub mod core;
pub mod debug;
pub mod services;

pub use config::SettleConfig;
pub use core::{AppError, Result};
pub use services::selection::TokenAccountSelectionStore;
pub use services::session::{WalletEvent, WalletSessionManager};
pub use services::settlement::{SettlementOrchestrator, SettlementReport, VenueOutcome};
