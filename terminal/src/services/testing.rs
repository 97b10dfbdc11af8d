//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::core::error::{AppError, Result, WalletError};
use crate::core::service::{ConnectionClient, MarketRegistry, Notifier, WalletSigningProvider};
use crate::services::markets::{Market, UnsettledBalances};
use crate::services::notify::Notification;
use crate::services::wallet::ProviderKind;

pub fn key(n: u8) -> Pubkey {
    Pubkey::new_from_array([n; 32])
}

// region: --- Wallet

pub struct MockWallet {
    kind: ProviderKind,
    keypair: Keypair,
    connected: AtomicBool,
    fail_connect: AtomicBool,
    hang_connect: AtomicBool,
    fail_disconnect: AtomicBool,
    reject_signing: AtomicBool,
    sign_calls: AtomicUsize,
}

impl MockWallet {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            keypair: Keypair::new_from_array([7; 32]),
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            hang_connect: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
            reject_signing: AtomicBool::new(false),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn identity(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Simulate the wallet closing the connection on its side.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Never answer the approval prompt.
    pub fn hang_connect(&self, hang: bool) {
        self.hang_connect.store(hang, Ordering::SeqCst);
    }

    /// Fail `disconnect` and keep the connection open.
    pub fn fail_disconnect(&self, fail: bool) {
        self.fail_disconnect.store(fail, Ordering::SeqCst);
    }

    pub fn reject_signing(&self, reject: bool) {
        self.reject_signing.store(reject, Ordering::SeqCst);
    }

    /// Number of signature requests (one per batch).
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigningProvider for MockWallet {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.keypair.pubkey())
    }

    async fn connect(&self) -> std::result::Result<Pubkey, WalletError> {
        if self.hang_connect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(WalletError::Connection("user closed the popup".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> std::result::Result<(), WalletError> {
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(WalletError::Connection("wallet did not respond".to_string()));
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> std::result::Result<Transaction, WalletError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(transaction)
    }

    async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> std::result::Result<Vec<Transaction>, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_signing.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected("User rejected the request".to_string()));
        }
        let mut signed = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            signed.push(self.sign_transaction(transaction).await?);
        }
        Ok(signed)
    }
}

// endregion: --- Wallet

// region: --- Markets

pub const PROGRAM: [u8; 32] = [90; 32];

pub fn market(address: u8, name: &str, base_mint: u8, quote_mint: u8) -> Market {
    Market {
        address: key(address),
        name: name.to_string(),
        base_mint: key(base_mint),
        quote_mint: key(quote_mint),
        program_id: Pubkey::new_from_array(PROGRAM),
        open_orders: None,
        custom: false,
    }
}

#[derive(Default)]
pub struct MockRegistry {
    markets: Mutex<Option<Vec<Market>>>,
    balances: Mutex<HashMap<Pubkey, UnsettledBalances>>,
    failing_balances: Mutex<HashSet<Pubkey>>,
    instructions_per_market: AtomicUsize,
}

impl MockRegistry {
    pub fn loaded(markets: Vec<Market>) -> Self {
        let registry = Self::default();
        *registry.markets.lock() = Some(markets);
        registry.instructions_per_market.store(1, Ordering::SeqCst);
        registry
    }

    pub fn set_unsettled(&self, market: &Pubkey, base_free: u64, quote_free: u64) {
        self.balances.lock().insert(
            *market,
            UnsettledBalances {
                base_free,
                base_total: base_free,
                quote_free,
                quote_total: quote_free,
            },
        );
    }

    pub fn unsettled(&self, market: &Pubkey) -> UnsettledBalances {
        self.balances.lock().get(market).copied().unwrap_or_default()
    }

    /// Settled funds leave the open-orders account.
    pub fn settle(&self, market: &Pubkey) {
        if let Some(b) = self.balances.lock().get_mut(market) {
            b.base_total -= b.base_free;
            b.quote_total -= b.quote_free;
            b.base_free = 0;
            b.quote_free = 0;
        }
    }

    pub fn fail_balances_for(&self, market: &Pubkey) {
        self.failing_balances.lock().insert(*market);
    }

    pub fn set_instructions_per_market(&self, n: usize) {
        self.instructions_per_market.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl MarketRegistry for MockRegistry {
    fn markets(&self) -> Option<Vec<Market>> {
        self.markets.lock().clone()
    }

    async fn unsettled_balances(&self, market: &Market, _owner: &Pubkey) -> Result<UnsettledBalances> {
        if self.failing_balances.lock().contains(&market.address) {
            return Err(AppError::Market(format!("open orders for {} unavailable", market.name)));
        }
        Ok(self.unsettled(&market.address))
    }

    async fn settle_instructions(
        &self,
        market: &Market,
        owner: &Pubkey,
        base_destination: &Pubkey,
        quote_destination: &Pubkey,
    ) -> Result<Vec<Instruction>> {
        let n = self.instructions_per_market.load(Ordering::SeqCst);
        Ok((0..n)
            .map(|i| {
                Instruction::new_with_bytes(
                    market.program_id,
                    &[5, i as u8],
                    vec![
                        AccountMeta::new(market.address, false),
                        AccountMeta::new_readonly(*owner, true),
                        AccountMeta::new(*base_destination, false),
                        AccountMeta::new(*quote_destination, false),
                    ],
                )
            })
            .collect())
    }
}

// endregion: --- Markets

// region: --- Connection

/// Network stub. A successful send settles every market referenced by the transaction.
pub struct MockConnection {
    registry: Arc<MockRegistry>,
    sent: Mutex<Vec<Transaction>>,
    fail_send_for: Mutex<HashSet<Pubkey>>,
    fail_confirm_for: Mutex<HashSet<Pubkey>>,
    fail_blockhash: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
    pub entered_send: Notify,
}

impl MockConnection {
    pub fn new(registry: Arc<MockRegistry>) -> Self {
        Self {
            registry,
            sent: Mutex::new(Vec::new()),
            fail_send_for: Mutex::new(HashSet::new()),
            fail_confirm_for: Mutex::new(HashSet::new()),
            fail_blockhash: AtomicBool::new(false),
            gate: Mutex::new(None),
            entered_send: Notify::new(),
        }
    }

    /// Hold every send until the returned handle is notified.
    pub fn gate_sends(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    pub fn fail_send_for(&self, market: &Pubkey) {
        self.fail_send_for.lock().insert(*market);
    }

    pub fn fail_confirm_for(&self, market: &Pubkey) {
        self.fail_confirm_for.lock().insert(*market);
    }

    pub fn fail_blockhash(&self) {
        self.fail_blockhash.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    fn touches(set: &Mutex<HashSet<Pubkey>>, transaction: &Transaction) -> bool {
        let set = set.lock();
        transaction.message.account_keys.iter().any(|k| set.contains(k))
    }
}

#[async_trait]
impl ConnectionClient for MockConnection {
    async fn latest_blockhash(&self) -> Result<Hash> {
        if self.fail_blockhash.load(Ordering::SeqCst) {
            return Err(AppError::Rpc("blockhash not available".to_string()));
        }
        Ok(Hash::new_from_array([42; 32]))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        self.entered_send.notify_one();
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if Self::touches(&self.fail_send_for, transaction) {
            return Err(AppError::Rpc("node is behind".to_string()));
        }
        self.sent.lock().push(transaction.clone());
        for account in &transaction.message.account_keys {
            self.registry.settle(account);
        }
        transaction
            .signatures
            .first()
            .copied()
            .ok_or_else(|| AppError::Rpc("transaction is not signed".to_string()))
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<()> {
        let sent = self.sent.lock();
        let transaction = sent
            .iter()
            .find(|t| t.signatures.first() == Some(signature))
            .ok_or_else(|| AppError::Rpc("unknown signature".to_string()))?;
        if Self::touches(&self.fail_confirm_for, transaction) {
            return Err(AppError::Rpc("confirmation timed out".to_string()));
        }
        Ok(())
    }
}

// endregion: --- Connection

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.notifications.lock().len()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .map(|n| n.description.clone())
            .collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.notifications.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}
