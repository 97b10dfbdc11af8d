//! # Common Error Types
//!
//! Consolidated error handling for the settlement core.
//!
//! Each subsystem owns a focused error enum; [`AppError`] folds them together for
//! callers that drive several subsystems and only want one error type.
//!
//! ## Error Categories
//!
//! - **Wallet**: session lifecycle and signing ([`WalletError`])
//! - **Selection**: destination-account bindings ([`SelectionError`])
//! - **Settle**: whole-attempt settlement failures ([`SettleError`])
//! - **Config**: environment configuration ([`ConfigError`])
//! - **Rpc**: network collaborator failures
//! - **Market**: market registry failures
//!
//! Per-venue build, submission and confirmation failures are not errors at this level.
//! They are recorded as [`crate::services::settlement::VenueOutcome`] values and folded
//! into the settlement report.
//!
//! ## Usage Pattern
//!
//! ```rust,no_run
//! use dex_terminal::core::error::{AppError, Result};
//!
//! fn require_markets(loaded: bool) -> Result<()> {
//!     if !loaded {
//!         return Err(AppError::Market("Markets not connected".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::services::selection::SelectionError;
pub use crate::services::settlement::SettleError;
pub use crate::services::wallet::WalletError;

/// Application-wide error type.
///
/// The `#[error]` attribute from `thiserror` provides `Display` and `Error`; the
/// `#[from]` conversions let `?` lift subsystem errors without extra mapping.
///
/// ```rust
/// use dex_terminal::core::error::AppError;
///
/// let err = AppError::Rpc("Connection timeout".to_string());
/// assert_eq!(err.to_string(), "RPC error: Connection timeout");
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Wallet session or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// Destination-account selection rejected.
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// A settlement attempt stopped as a whole.
    #[error("Settlement error: {0}")]
    Settle(#[from] SettleError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Network collaborator failure (blockhash, send, confirm).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Market registry failure (balances, instruction builder).
    #[error("Market error: {0}")]
    Market(String),
}

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Short, user-facing description used in notifications.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Wallet(e) => e.to_string(),
            AppError::Selection(e) => e.to_string(),
            AppError::Settle(e) => e.to_string(),
            AppError::Config(_) => "Invalid configuration".to_string(),
            AppError::Rpc(_) => "Network temporarily unavailable".to_string(),
            AppError::Market(msg) => msg.clone(),
        }
    }
}
