//! # Core Abstractions
//!
//! Error types and collaborator traits shared by every service.
//!
//! - **[`error`]**: `AppError`, `Result<T>` and the subsystem error re-exports
//! - **[`service`]**: collaborator capability traits for dependency injection
//!
//! ```rust,no_run
//! use dex_terminal::core::{ConnectionClient, MarketRegistry, Notifier};
//! use std::sync::Arc;
//!
//! fn wire(rpc: Arc<dyn ConnectionClient>, markets: Arc<dyn MarketRegistry>, notifier: Arc<dyn Notifier>) {
//!     // hand these to the settlement orchestrator
//! #   let _ = (rpc, markets, notifier);
//! }
//! ```

pub mod error;
pub mod service;

pub use error::{AppError, Result};
pub use service::{ConnectionClient, MarketRegistry, Notifier, TokenAccountsProvider, WalletSigningProvider};
