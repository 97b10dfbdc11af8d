//! # Logging
//!
//! `tracing` subscriber setup for applications embedding the settlement core.
//!
//! The library itself only emits events; nothing is printed until the embedding binary
//! installs a subscriber:
//!
//! ```rust,no_run
//! use dex_terminal::debug::{self, LogConfig};
//!
//! let _guard = debug::init_logger(&LogConfig::from_env());
//! ```
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (e.g., `dex_terminal=debug,info`)
//! - `TERMINAL_LOG_DIR`: Directory for `terminal.log` (daily rotation)
//! - `TERMINAL_LOG_JSON`: JSON lines on stderr (1=on, 0=off)

pub mod config;
pub mod logger;

pub use config::LogConfig;
pub use logger::init as init_logger;
