//! # Wallet Balances
//!
//! Per-asset rows for the balances table shown next to the "Settle all funds" action.
//!
//! One row per mint traded in any venue, in the order the mints first appear. Amounts
//! are raw token units; formatting with decimals is left to the renderer.

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::services::accounts::TokenAccount;
use crate::services::markets::{Market, UnsettledBalances};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletBalanceRow {
    /// Ticker from the venue name, or an abbreviated mint
    pub coin: String,
    #[serde(serialize_with = "crate::services::serialize_pubkey")]
    pub mint: Pubkey,
    /// Held across all of the owner's accounts for this mint
    pub wallet_balance: u64,
    /// Settleable amount across venues
    pub open_orders_free: u64,
    /// Free plus locked in resting orders
    pub open_orders_total: u64,
}

/// Build the balance rows from token accounts and per-venue unsettled balances.
pub fn wallet_balances(accounts: &[TokenAccount], venues: &[(Market, UnsettledBalances)]) -> Vec<WalletBalanceRow> {
    let mut rows: Vec<WalletBalanceRow> = Vec::new();

    for (market, unsettled) in venues {
        let (base_symbol, quote_symbol) = match market.symbols() {
            Some((base, quote)) => (Some(base), Some(quote)),
            None => (None, None),
        };
        let legs = [
            (market.base_mint, base_symbol, unsettled.base_free, unsettled.base_total),
            (market.quote_mint, quote_symbol, unsettled.quote_free, unsettled.quote_total),
        ];
        for (mint, symbol, free, total) in legs {
            let index = match rows.iter().position(|r| r.mint == mint) {
                Some(index) => index,
                None => {
                    rows.push(WalletBalanceRow {
                        coin: coin_name(&mint, symbol),
                        mint,
                        wallet_balance: held(accounts, &mint),
                        open_orders_free: 0,
                        open_orders_total: 0,
                    });
                    rows.len() - 1
                }
            };
            let row = &mut rows[index];
            row.open_orders_free = row.open_orders_free.saturating_add(free);
            row.open_orders_total = row.open_orders_total.saturating_add(total);
        }
    }
    rows
}

fn coin_name(mint: &Pubkey, symbol: Option<&str>) -> String {
    match symbol {
        Some(symbol) if !symbol.is_empty() => symbol.to_string(),
        _ => shared::format_address(&mint.to_string(), 4, 4),
    }
}

fn held(accounts: &[TokenAccount], mint: &Pubkey) -> u64 {
    accounts
        .iter()
        .filter(|a| a.mint == *mint)
        .fold(0u64, |sum, a| sum.saturating_add(a.balance))
}
