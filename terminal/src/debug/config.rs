//! Logging configuration from environment variables

use lib_utils::{get_env_flag, get_env_opt};
use std::path::PathBuf;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "dex_terminal=info,warn";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level filter (e.g., "dex_terminal=debug,info")
    pub log_level: String,
    /// Directory for the daily-rotated log file; stderr only when unset
    pub log_dir: Option<PathBuf>,
    /// Emit JSON lines on stderr instead of the human-readable format
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
            json: false,
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    ///
    /// - `RUST_LOG`: filter directives
    /// - `TERMINAL_LOG_DIR`: enables the file layer
    /// - `TERMINAL_LOG_JSON`: `1` for JSON output
    pub fn from_env() -> Self {
        Self {
            log_level: get_env_opt("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_dir: get_env_opt("TERMINAL_LOG_DIR").map(PathBuf::from),
            json: get_env_flag("TERMINAL_LOG_JSON", false).unwrap_or(false),
        }
    }

    /// Check if debug logging is enabled
    pub fn is_debug_enabled(&self) -> bool {
        self.log_level.contains("debug") || self.log_level.contains("trace")
    }
}
