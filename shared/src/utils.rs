//! # Shared Utility Functions
//!
//! Address formatting used by the wallet session (notifications) and the balance table.
//!
//! ## Usage
//!
//! ```rust
//! use shared::utils::{display_identity, format_address};
//!
//! let address = "8W6QginkhTTxoP2deQjq7rZ9YMwN5FH9JYuLfSKuJKAL";
//! assert_eq!(display_identity(address), "8W6Qgin.....SKuJKAL");
//! assert_eq!(format_address(address, 4, 4), "8W6Q...JKAL");
//! ```

/// Addresses at or below this length are shown in full by [`display_identity`].
pub const IDENTITY_FULL_DISPLAY_MAX: usize = 20;

/// Characters kept at each end of an identity by [`display_identity`].
pub const IDENTITY_EDGE_CHARS: usize = 7;

/// Format a wallet address by showing the first `prefix_len` and last `suffix_len` characters.
///
/// If the address is shorter than `prefix_len + suffix_len`, it is returned as-is.
///
/// # Examples
///
/// ```rust
/// use shared::utils::format_address;
///
/// let addr = "8W6QginkhTTxoP2deQjq7rZ9YMwN5FH9JYuLfSKuJKAL";
/// assert_eq!(format_address(addr, 4, 4), "8W6Q...JKAL");
/// assert_eq!(format_address("short", 4, 4), "short");
/// ```
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    abbreviate(address, prefix_len, suffix_len, "...")
}

/// Display-safe form of a wallet identity.
///
/// Identities longer than 20 characters become the first 7 and last 7 characters
/// joined by `.....`; shorter ones are returned unchanged.
///
/// ```rust
/// use shared::utils::display_identity;
///
/// assert_eq!(display_identity("8W6QginkhTTxoP2deQjq7rZ9YMwN5FH9JYuLfSKuJKAL"), "8W6Qgin.....SKuJKAL");
/// assert_eq!(display_identity("exactly-twenty-chars"), "exactly-twenty-chars");
/// ```
pub fn display_identity(address: &str) -> String {
    if address.chars().count() <= IDENTITY_FULL_DISPLAY_MAX {
        return address.to_string();
    }
    abbreviate(address, IDENTITY_EDGE_CHARS, IDENTITY_EDGE_CHARS, ".....")
}

fn abbreviate(address: &str, prefix_len: usize, suffix_len: usize, separator: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let len = chars.len();

    if len <= prefix_len + suffix_len {
        return address.to_string();
    }

    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[len - suffix_len..].iter().collect();

    format!("{}{}{}", prefix, separator, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_address() {
        let addr = "8W6QginkhTTxoP2deQjq7rZ9YMwN5FH9JYuLfSKuJKAL";
        assert_eq!(format_address(addr, 4, 4), "8W6Q...JKAL");
        assert_eq!(format_address(addr, 6, 6), "8W6Qgi...uJKAL");
        assert_eq!(format_address(addr, 2, 2), "8W...AL");
    }

    #[test]
    fn test_format_address_short() {
        assert_eq!(format_address("short", 4, 4), "short");
        assert_eq!(format_address("abc", 4, 4), "abc");
    }

    #[test]
    fn test_display_identity_long_address() {
        let addr = "8W6QginkhTTxoP2deQjq7rZ9YMwN5FH9JYuLfSKuJKAL";
        assert_eq!(display_identity(addr), "8W6Qgin.....SKuJKAL");
    }

    #[test]
    fn test_display_identity_boundary() {
        // 20 characters: shown in full
        assert_eq!(display_identity("abcdefghijklmnopqrst"), "abcdefghijklmnopqrst");
        // 21 characters: abbreviated
        assert_eq!(display_identity("abcdefghijklmnopqrstu"), "abcdefg.....opqrstu");
    }

    #[test]
    fn test_display_identity_empty() {
        assert_eq!(display_identity(""), "");
    }
}
