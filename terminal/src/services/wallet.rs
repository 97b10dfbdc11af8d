//! # Wallet Providers
//!
//! The closed table of known signing providers and the keypair-file adapter.
//!
//! ## Features
//! - [`ProviderKind`]: every wallet the terminal knows how to present
//! - [`ProviderTable`]: concrete adapters registered against those kinds
//! - [`KeypairWallet`]: local signer backed by a Solana CLI keypair file or base58 secret
//!
//! Browser and hardware wallets are registered by the embedding application as their
//! own [`WalletSigningProvider`] implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::service::WalletSigningProvider;

const ASSET_URL: &str = "https://cdn.jsdelivr.net/gh/solana-labs/oyster@main/assets/wallets";

/// Wallet session and signing errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// Queried before any provider ever attempted to attach
    #[error("No wallet session has been started")]
    NoSession,
    /// Operation needs an attached wallet
    #[error("Wallet not connected")]
    NotConnected,
    /// A connect or disconnect is already running
    #[error("Wallet connection change already in progress")]
    ConnectionInProgress,
    /// No adapter registered for the requested provider
    #[error("Unknown wallet provider: {0}")]
    UnknownProvider(String),
    /// Provider failed to attach
    #[error("Connection error: {0}")]
    Connection(String),
    /// User or provider declined to sign
    #[error("Signature request rejected: {0}")]
    Rejected(String),
    /// Transaction signing error
    #[error("Signing error: {0}")]
    Signing(String),
    /// Failed to load keypair from file
    #[error("Keypair load error: {0}")]
    KeypairLoad(String),
    /// Invalid keypair format
    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Display metadata for a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub url: &'static str,
    pub icon: String,
}

/// Supported wallet provider types
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Sollet,
    SolletExtension,
    Ledger,
    Solflare,
    SolflareExtension,
    Phantom,
    MathWallet,
    KeypairFile,
}

impl ProviderKind {
    /// Every known provider, in the order the connect menu lists them.
    pub const ALL: [ProviderKind; 8] = [
        ProviderKind::Sollet,
        ProviderKind::SolletExtension,
        ProviderKind::Ledger,
        ProviderKind::Solflare,
        ProviderKind::SolflareExtension,
        ProviderKind::Phantom,
        ProviderKind::MathWallet,
        ProviderKind::KeypairFile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Sollet => "sollet.io",
            ProviderKind::SolletExtension => "Sollet Extension",
            ProviderKind::Ledger => "Ledger",
            ProviderKind::Solflare => "Solflare",
            ProviderKind::SolflareExtension => "Solflare Extension",
            ProviderKind::Phantom => "Phantom",
            ProviderKind::MathWallet => "MathWallet",
            ProviderKind::KeypairFile => "Keypair File",
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            ProviderKind::Sollet => "https://www.sollet.io",
            ProviderKind::SolletExtension => "https://www.sollet.io/extension",
            ProviderKind::Ledger => "https://www.ledger.com",
            ProviderKind::Solflare => "https://solflare.com/access-wallet",
            ProviderKind::SolflareExtension => "https://solflare.com",
            ProviderKind::Phantom => "https://www.phantom.app",
            ProviderKind::MathWallet => "https://www.mathwallet.org",
            ProviderKind::KeypairFile => "https://docs.solana.com/cli/wallets/file-system",
        }
    }

    pub fn info(&self) -> ProviderInfo {
        let icon = match self {
            ProviderKind::Sollet | ProviderKind::SolletExtension => format!("{ASSET_URL}/sollet.svg"),
            ProviderKind::Ledger => format!("{ASSET_URL}/ledger.svg"),
            ProviderKind::Solflare | ProviderKind::SolflareExtension => format!("{ASSET_URL}/solflare.svg"),
            ProviderKind::Phantom => "https://www.phantom.app/img/logo.png".to_string(),
            ProviderKind::MathWallet => format!("{ASSET_URL}/mathwallet.svg"),
            ProviderKind::KeypairFile => String::new(),
        };
        ProviderInfo {
            name: self.name(),
            url: self.url(),
            icon,
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<ProviderKind> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

/// Concrete adapters registered against [`ProviderKind`]s.
#[derive(Default, Clone)]
pub struct ProviderTable {
    providers: BTreeMap<ProviderKind, Arc<dyn WalletSigningProvider>>,
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter. A later registration for the same kind replaces the earlier one.
    pub fn register(&mut self, provider: Arc<dyn WalletSigningProvider>) -> &mut Self {
        let kind = provider.kind();
        debug!(provider = kind.name(), "Registered wallet provider");
        self.providers.insert(kind, provider);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn WalletSigningProvider>> {
        self.providers.get(&kind).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn WalletSigningProvider>> {
        ProviderKind::from_name(name).and_then(|kind| self.get(kind))
    }

    /// Registered providers in table order.
    pub fn available(&self) -> Vec<ProviderInfo> {
        self.providers.keys().map(ProviderKind::info).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Local signer backed by a keypair held in memory.
pub struct KeypairWallet {
    keypair: Keypair,
    connected: AtomicBool,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            connected: AtomicBool::new(false),
        }
    }

    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self::new(Keypair::new())
    }

    /// Load keypair from file
    ///
    /// Supports multiple formats:
    /// - JSON array format as written by the Solana CLI: `[1,2,3,...]`
    /// - Base58 encoded secret
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| WalletError::KeypairLoad(format!("Failed to read {}: {}", path.display(), e)))?;

        let keypair = if contents.trim().starts_with('[') {
            let bytes: Vec<u8> = serde_json::from_str(&contents)
                .map_err(|e| WalletError::InvalidKeypair(format!("Invalid JSON format: {}", e)))?;
            keypair_from_secret(&bytes)?
        } else {
            keypair_from_base58(&contents)?
        };

        info!(pubkey = %keypair.pubkey(), path = %path.display(), "Loaded keypair");
        Ok(Self::new(keypair))
    }

    /// Load keypair from base58 string
    pub fn from_base58(base58_key: &str) -> Result<Self, WalletError> {
        Ok(Self::new(keypair_from_base58(base58_key)?))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

fn keypair_from_base58(encoded: &str) -> Result<Keypair, WalletError> {
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|e| WalletError::InvalidKeypair(format!("Invalid base58: {}", e)))?;
    keypair_from_secret(&bytes)
}

/// Accepts a 32-byte secret or a 64-byte secret+public pair (Solana CLI layout).
fn keypair_from_secret(bytes: &[u8]) -> Result<Keypair, WalletError> {
    if bytes.len() != 32 && bytes.len() != 64 {
        return Err(WalletError::InvalidKeypair(format!(
            "Expected 32 or 64 bytes, got {}",
            bytes.len()
        )));
    }
    let mut secret = [0u8; 32];
    secret.copy_from_slice(&bytes[..32]);
    let keypair = Keypair::new_from_array(secret);

    if bytes.len() == 64 && keypair.pubkey().to_bytes()[..] != bytes[32..] {
        return Err(WalletError::InvalidKeypair(
            "Public key half does not match secret".to_string(),
        ));
    }
    Ok(keypair)
}

#[async_trait]
impl WalletSigningProvider for KeypairWallet {
    fn kind(&self) -> ProviderKind {
        ProviderKind::KeypairFile
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.keypair.pubkey())
    }

    async fn connect(&self) -> Result<Pubkey, WalletError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction, WalletError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WalletError::NotConnected);
        }
        let recent_blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], recent_blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::instruction::{AccountMeta, Instruction};

    fn settle_like_transaction(payer: &Pubkey) -> Transaction {
        let program = Pubkey::new_from_array([9; 32]);
        let ix = Instruction::new_with_bytes(program, &[5], vec![AccountMeta::new(*payer, true)]);
        let mut tx = Transaction::new_with_payer(&[ix], Some(payer));
        tx.message.recent_blockhash = Hash::new_from_array([3; 32]);
        tx
    }

    #[test]
    fn test_provider_kind_lookup() {
        assert_eq!(ProviderKind::from_name("phantom"), Some(ProviderKind::Phantom));
        assert_eq!(ProviderKind::from_name(" Sollet Extension "), Some(ProviderKind::SolletExtension));
        assert_eq!(ProviderKind::from_name("unknown"), None);
    }

    #[test]
    fn test_provider_info_table() {
        let info = ProviderKind::Ledger.info();
        assert_eq!(info.name, "Ledger");
        assert_eq!(info.url, "https://www.ledger.com");
        assert!(info.icon.ends_with("ledger.svg"));
    }

    #[test]
    fn test_provider_table_register_and_lookup() {
        let mut table = ProviderTable::new();
        assert!(table.is_empty());
        table.register(Arc::new(KeypairWallet::generate()));

        assert!(table.get(ProviderKind::KeypairFile).is_some());
        assert!(table.get_by_name("keypair file").is_some());
        assert!(table.get(ProviderKind::Phantom).is_none());
        assert_eq!(table.available().len(), 1);
    }

    #[test]
    fn test_keypair_from_secret_rejects_bad_length() {
        let err = keypair_from_secret(&[1u8; 10]).err();
        assert!(matches!(err, Some(WalletError::InvalidKeypair(_))));
    }

    #[test]
    fn test_keypair_from_cli_layout() {
        let original = Keypair::new();
        let bytes = original.to_bytes();
        let restored = keypair_from_secret(&bytes).expect("64-byte keypair should load");
        assert_eq!(restored.pubkey(), original.pubkey());

        let mut tampered = bytes;
        tampered[40] ^= 0xff;
        assert!(keypair_from_secret(&tampered).is_err());
    }

    #[test]
    fn test_keypair_from_file() {
        let original = Keypair::new();
        let path = std::env::temp_dir().join(format!("dex-terminal-test-{}.json", original.pubkey()));
        let json = serde_json::to_string(&original.to_bytes().to_vec()).expect("serialize keypair");
        fs::write(&path, json).expect("write keypair file");

        let wallet = KeypairWallet::from_file(&path).expect("load keypair");
        assert_eq!(wallet.pubkey(), original.pubkey());

        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_connect_exposes_public_key() {
        let wallet = KeypairWallet::generate();
        assert_eq!(wallet.public_key(), None);
        assert!(!wallet.is_connected());

        let pubkey = wallet.connect().await.expect("connect");
        assert_eq!(wallet.public_key(), Some(pubkey));

        wallet.disconnect().await.expect("disconnect");
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn test_sign_requires_connection() {
        let wallet = KeypairWallet::generate();
        let tx = settle_like_transaction(&wallet.pubkey());
        let err = wallet.sign_transaction(tx).await.err();
        assert!(matches!(err, Some(WalletError::NotConnected)));
    }

    #[tokio::test]
    async fn test_sign_transaction() {
        let wallet = KeypairWallet::generate();
        wallet.connect().await.expect("connect");

        let tx = settle_like_transaction(&wallet.pubkey());
        let signed = wallet.sign_transaction(tx).await.expect("sign");
        assert!(signed.is_signed());
        assert!(signed.verify().is_ok());
    }
}
