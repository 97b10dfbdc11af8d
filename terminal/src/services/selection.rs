//! # Token Account Selection
//!
//! Per-mint binding of the token account that receives settled funds.
//!
//! An owner may hold several accounts for the same mint. The user can pick one
//! explicitly; otherwise the default is the account with the largest balance, ties
//! broken by the lowest address so the choice is stable across refreshes.
//!
//! Explicit bindings are validated against the latest snapshot every time they are
//! read. A binding whose account disappeared, or now reports a different mint, is
//! dropped and the default takes over.

use parking_lot::RwLock;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::service::TokenAccountsProvider;
use crate::services::accounts::TokenAccount;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Account {account} holds mint {account_mint}, not {mint}")]
    InvalidSelection {
        mint: Pubkey,
        account: Pubkey,
        account_mint: Pubkey,
    },
    #[error("Account {0} is not among the loaded token accounts")]
    UnknownAccount(Pubkey),
}

/// Mint to destination-account bindings.
pub struct TokenAccountSelectionStore {
    accounts: Arc<dyn TokenAccountsProvider>,
    selected: RwLock<HashMap<Pubkey, Pubkey>>,
}

impl TokenAccountSelectionStore {
    pub fn new(accounts: Arc<dyn TokenAccountsProvider>) -> Self {
        Self {
            accounts,
            selected: RwLock::new(HashMap::new()),
        }
    }

    /// Destination for `mint` against the current snapshot.
    ///
    /// Before any snapshot is loaded only an explicit binding can answer, and it is
    /// returned unvalidated.
    pub fn selected(&self, mint: &Pubkey) -> Option<Pubkey> {
        match self.accounts.snapshot() {
            Some(accounts) => self.selected_in(mint, &accounts),
            None => self.selected.read().get(mint).copied(),
        }
    }

    /// Destination for `mint` against a caller-held snapshot.
    ///
    /// The orchestrator reads the snapshot once per attempt and resolves every venue
    /// against that same list.
    pub fn selected_in(&self, mint: &Pubkey, accounts: &[TokenAccount]) -> Option<Pubkey> {
        let explicit = self.selected.read().get(mint).copied();
        if let Some(address) = explicit {
            match accounts.iter().find(|a| a.address == address) {
                Some(account) if account.mint == *mint => return Some(address),
                found => {
                    warn!(
                        mint = %mint,
                        account = %address,
                        present = found.is_some(),
                        "Dropping stale token account selection"
                    );
                    let mut selected = self.selected.write();
                    // only drop the binding we validated
                    if selected.get(mint) == Some(&address) {
                        selected.remove(mint);
                    }
                }
            }
        }
        default_account(mint, accounts).map(|a| a.address)
    }

    /// Bind `account` as the destination for `mint`.
    ///
    /// The account must be in the current snapshot and hold `mint`. On error the
    /// previous binding is left as it was.
    pub fn set_selected(&self, mint: Pubkey, account: Pubkey) -> Result<(), SelectionError> {
        let accounts = self.accounts.snapshot().unwrap_or_default();
        let found = accounts
            .iter()
            .find(|a| a.address == account)
            .ok_or(SelectionError::UnknownAccount(account))?;
        if found.mint != mint {
            return Err(SelectionError::InvalidSelection {
                mint,
                account,
                account_mint: found.mint,
            });
        }
        debug!(mint = %mint, account = %account, "Token account selected");
        self.selected.write().insert(mint, account);
        Ok(())
    }

    /// Remove the explicit binding for `mint`, reverting to the default.
    pub fn clear(&self, mint: &Pubkey) {
        if self.selected.write().remove(mint).is_some() {
            debug!(mint = %mint, "Token account selection cleared");
        }
    }

    /// Accounts holding `mint`, largest balance first.
    pub fn accounts_for(&self, mint: &Pubkey) -> Vec<TokenAccount> {
        let Some(accounts) = self.accounts.snapshot() else {
            return Vec::new();
        };
        let mut matching: Vec<TokenAccount> = accounts
            .iter()
            .filter(|a| a.mint == *mint)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.balance.cmp(&a.balance).then(a.address.cmp(&b.address)));
        matching
    }
}

/// Largest-balance account for `mint`, lowest address on ties.
pub fn default_account<'a>(mint: &Pubkey, accounts: &'a [TokenAccount]) -> Option<&'a TokenAccount> {
    accounts
        .iter()
        .filter(|a| a.mint == *mint)
        .min_by(|a, b| b.balance.cmp(&a.balance).then(a.address.cmp(&b.address)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::accounts::TokenAccountsSnapshot;

    fn key(n: u8) -> Pubkey {
        Pubkey::new_from_array([n; 32])
    }

    fn account(address: u8, mint: u8, balance: u64) -> TokenAccount {
        TokenAccount {
            address: key(address),
            owner: key(200),
            mint: key(mint),
            balance,
        }
    }

    fn store(accounts: Vec<TokenAccount>) -> (TokenAccountSelectionStore, Arc<TokenAccountsSnapshot>) {
        let snapshot = Arc::new(TokenAccountsSnapshot::loaded(accounts));
        (TokenAccountSelectionStore::new(snapshot.clone()), snapshot)
    }

    #[test]
    fn test_default_is_largest_balance() {
        let (store, _) = store(vec![account(10, 1, 5), account(11, 1, 50), account(12, 2, 500)]);
        assert_eq!(store.selected(&key(1)), Some(key(11)));
        assert_eq!(store.selected(&key(2)), Some(key(12)));
        assert_eq!(store.selected(&key(3)), None);
    }

    #[test]
    fn test_default_tie_breaks_on_lowest_address() {
        let (store, _) = store(vec![account(30, 1, 7), account(20, 1, 7), account(25, 1, 7)]);
        assert_eq!(store.selected(&key(1)), Some(key(20)));
    }

    #[test]
    fn test_explicit_selection_wins_until_cleared() {
        let (store, _) = store(vec![account(10, 1, 5), account(11, 1, 50)]);

        store.set_selected(key(1), key(10)).expect("valid selection");
        assert_eq!(store.selected(&key(1)), Some(key(10)));

        store.clear(&key(1));
        assert_eq!(store.selected(&key(1)), Some(key(11)));
    }

    #[test]
    fn test_set_selected_rejects_mismatched_mint() {
        let (store, _) = store(vec![account(10, 1, 5), account(11, 2, 50)]);
        store.set_selected(key(1), key(10)).expect("valid selection");

        let err = store.set_selected(key(1), key(11)).err();
        assert_eq!(
            err,
            Some(SelectionError::InvalidSelection {
                mint: key(1),
                account: key(11),
                account_mint: key(2),
            })
        );
        // unchanged
        assert_eq!(store.selected(&key(1)), Some(key(10)));
    }

    #[test]
    fn test_set_selected_rejects_unknown_account() {
        let (store, _) = store(vec![account(10, 1, 5)]);
        let err = store.set_selected(key(1), key(99)).err();
        assert_eq!(err, Some(SelectionError::UnknownAccount(key(99))));
    }

    #[test]
    fn test_stale_selection_falls_back_to_default() {
        let (store, snapshot) = store(vec![account(10, 1, 5), account(11, 1, 50)]);
        store.set_selected(key(1), key(10)).expect("valid selection");

        // account 10 closed
        snapshot.replace(vec![account(11, 1, 50)]);
        assert_eq!(store.selected(&key(1)), Some(key(11)));

        // binding is gone even if the account reappears
        snapshot.replace(vec![account(10, 1, 500), account(11, 1, 50)]);
        assert_eq!(store.selected(&key(1)), Some(key(10)));
        snapshot.replace(vec![account(10, 1, 1), account(11, 1, 50)]);
        assert_eq!(store.selected(&key(1)), Some(key(11)));
    }

    #[test]
    fn test_selection_without_snapshot_is_unvalidated() {
        let snapshot = Arc::new(TokenAccountsSnapshot::new());
        let store = TokenAccountSelectionStore::new(snapshot.clone());
        assert_eq!(store.selected(&key(1)), None);

        snapshot.replace(vec![account(10, 1, 5)]);
        store.set_selected(key(1), key(10)).expect("valid selection");
        snapshot.clear();
        assert_eq!(store.selected(&key(1)), Some(key(10)));
    }

    #[test]
    fn test_accounts_for_orders_by_balance() {
        let (store, _) = store(vec![account(10, 1, 5), account(11, 1, 50), account(12, 2, 9), account(9, 1, 5)]);
        let addresses: Vec<Pubkey> = store.accounts_for(&key(1)).into_iter().map(|a| a.address).collect();
        assert_eq!(addresses, vec![key(11), key(9), key(10)]);
    }
}
