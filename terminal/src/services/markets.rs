//! # Markets
//!
//! Venue descriptors and per-owner unsettled balances as supplied by a
//! [`crate::core::service::MarketRegistry`].

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

/// One trading venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Market {
    /// Market address
    #[serde(serialize_with = "crate::services::serialize_pubkey")]
    pub address: Pubkey,
    /// Display name, `BASE/QUOTE`
    pub name: String,
    /// Base asset mint
    #[serde(serialize_with = "crate::services::serialize_pubkey")]
    pub base_mint: Pubkey,
    /// Quote asset mint
    #[serde(serialize_with = "crate::services::serialize_pubkey")]
    pub quote_mint: Pubkey,
    /// Exchange program that owns the market
    #[serde(serialize_with = "crate::services::serialize_pubkey")]
    pub program_id: Pubkey,
    /// Owner's open-orders account on this venue, once the registry has resolved it
    #[serde(serialize_with = "crate::services::serialize_optional_pubkey")]
    pub open_orders: Option<Pubkey>,
    /// Added by the user rather than listed
    pub custom: bool,
}

impl Market {
    pub fn with_open_orders(mut self, open_orders: Pubkey) -> Self {
        self.open_orders = Some(open_orders);
        self
    }

    /// Base and quote symbols parsed from the display name.
    pub fn symbols(&self) -> Option<(&str, &str)> {
        self.name.split_once('/')
    }
}

/// Balances the owner holds in a venue's open-orders account.
///
/// `*_free` is the settleable part; `*_total` additionally includes amounts locked in
/// resting orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnsettledBalances {
    pub base_free: u64,
    pub base_total: u64,
    pub quote_free: u64,
    pub quote_total: u64,
}

impl UnsettledBalances {
    /// Nothing to move on either leg.
    pub fn is_empty(&self) -> bool {
        self.base_free == 0 && self.quote_free == 0
    }
}
