//! # Shared Helpers
//!
//! Small helpers used by more than one crate in the workspace.
//!
//! - **[`utils`]**: address formatting for logs, notifications and table cells
//!   - **[`utils::display_identity`]**: display-safe form of a wallet identity
//!   - **[`utils::format_address`]**: generic prefix/suffix abbreviation

pub mod utils;

pub use utils::*;
