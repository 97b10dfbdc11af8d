//! # Utilities Library
//!
//! Shared helpers for reading configuration from the environment.

pub mod envs;

// Re-export commonly used functions
pub use envs::{get_env, get_env_flag, get_env_opt, get_env_parse, get_env_parse_or};
