//! # Wallet Session
//!
//! Owns the connection lifecycle to one signing provider at a time.
//!
//! ## State machine
//!
//! ```text
//!   Disconnected ──connect()──▶ Connecting ──ok──▶ Connected
//!        ▲                          │                  │
//!        │                         err            disconnect()
//!        │                          ▼                  ▼
//!        └────────(next call)──── Error          Disconnecting ──▶ Disconnected
//! ```
//!
//! ## Edge events
//!
//! "Connected" and "disconnected" notifications fire once per flip of the connected
//! flag. The manager keeps the flag it last reported and compares it at every
//! transition, including the ones observed through [`WalletSessionManager::refresh`],
//! so repeated re-evaluation of an unchanged state never re-notifies.
//!
//! Subscribers receive the same edges as [`WalletEvent`]s on a broadcast channel.

use parking_lot::Mutex;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::SettleConfig;
use crate::core::service::{Notifier, WalletSigningProvider};
use crate::services::notify::Notification;
use crate::services::wallet::{ProviderInfo, ProviderKind, ProviderTable, WalletError};

const EVENT_CAPACITY: usize = 16;

/// Wallet connection status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    /// Last connect attempt failed; folds back to `Disconnected` on the next call
    Error(String),
}

/// Connection edge, delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    Connected { identity: Pubkey, display: String },
    Disconnected,
}

/// Read-only view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub identity: Option<Pubkey>,
    pub state: SessionState,
    pub provider: Option<ProviderInfo>,
}

impl WalletSession {
    pub fn connected(&self) -> bool {
        self.state == SessionState::Connected
    }
}

/// Fee tier cached for one identity.
///
/// The key is the owner only, not the asset, so it must be dropped whenever the owner
/// goes away or the next identity would inherit it.
#[derive(Debug, Default)]
pub struct FeeTierCache {
    entry: Mutex<Option<(Pubkey, u8)>>,
}

impl FeeTierCache {
    pub fn get(&self, owner: &Pubkey) -> Option<u8> {
        match *self.entry.lock() {
            Some((cached_owner, tier)) if cached_owner == *owner => Some(tier),
            _ => None,
        }
    }

    pub fn insert(&self, owner: Pubkey, tier: u8) {
        *self.entry.lock() = Some((owner, tier));
    }

    pub fn clear(&self) {
        *self.entry.lock() = None;
    }
}

struct SessionInner {
    state: SessionState,
    provider: Option<Arc<dyn WalletSigningProvider>>,
    identity: Option<Pubkey>,
    /// Set once any provider has been asked to attach
    ever_attached: bool,
    /// Connected flag as of the last emitted edge
    reported_connected: bool,
    /// Detached on our side; `refresh` must not re-attach until the next `connect`
    detached: bool,
}

/// Restores `Connecting` to `Disconnected` if a connect attempt is dropped mid-await.
struct ConnectGuard<'a> {
    inner: &'a Mutex<SessionInner>,
    finished: bool,
}

impl<'a> ConnectGuard<'a> {
    fn new(inner: &'a Mutex<SessionInner>) -> Self {
        Self { inner, finished: false }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for ConnectGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Connecting {
            warn!("Wallet connect abandoned before the provider answered");
            inner.state = SessionState::Disconnected;
            inner.identity = None;
            inner.detached = true;
        }
    }
}

/// Session-scoped owner of the signing provider.
///
/// Created once by the top-level entry point and shared by `Arc` with the
/// orchestrator and UI surfaces, which only read it.
pub struct WalletSessionManager {
    providers: ProviderTable,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<WalletEvent>,
    notifier: Arc<dyn Notifier>,
    fee_tiers: FeeTierCache,
}

impl WalletSessionManager {
    pub fn new(providers: ProviderTable, notifier: Arc<dyn Notifier>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            providers,
            inner: Mutex::new(SessionInner {
                state: SessionState::Disconnected,
                provider: None,
                identity: None,
                ever_attached: false,
                reported_connected: false,
                detached: false,
            }),
            events,
            notifier,
            fee_tiers: FeeTierCache::default(),
        }
    }

    /// Receive connection edges from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    pub fn providers(&self) -> &ProviderTable {
        &self.providers
    }

    pub fn fee_tiers(&self) -> &FeeTierCache {
        &self.fee_tiers
    }

    // region: --- Queries

    pub fn is_connected(&self) -> bool {
        self.inner.lock().state == SessionState::Connected
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    /// Snapshot of the session. Fails with [`WalletError::NoSession`] until a provider
    /// has been asked to attach at least once.
    pub fn session(&self) -> Result<WalletSession, WalletError> {
        let inner = self.inner.lock();
        if !inner.ever_attached {
            return Err(WalletError::NoSession);
        }
        Ok(WalletSession {
            identity: inner.identity,
            state: inner.state.clone(),
            provider: inner.provider.as_ref().map(|p| p.info()),
        })
    }

    /// Current identity; `Ok(None)` when attached once and now detached.
    pub fn identity(&self) -> Result<Option<Pubkey>, WalletError> {
        self.session().map(|s| s.identity)
    }

    /// Identity of the connected wallet, or [`WalletError::NotConnected`].
    pub fn connected_identity(&self) -> Result<Pubkey, WalletError> {
        let inner = self.inner.lock();
        match (&inner.state, inner.identity) {
            (SessionState::Connected, Some(identity)) => Ok(identity),
            _ => Err(WalletError::NotConnected),
        }
    }

    pub fn provider_name(&self) -> Result<&'static str, WalletError> {
        self.provider_info().map(|info| info.name)
    }

    pub fn provider_url(&self) -> Result<&'static str, WalletError> {
        self.provider_info().map(|info| info.url)
    }

    fn provider_info(&self) -> Result<ProviderInfo, WalletError> {
        self.session()?
            .provider
            .ok_or(WalletError::NoSession)
    }

    // endregion: --- Queries

    // region: --- Transitions

    /// Attach the registered provider of the given kind.
    ///
    /// Connecting while already connected to the same provider returns the current
    /// identity without emitting another edge.
    pub async fn connect(&self, kind: ProviderKind) -> Result<Pubkey, WalletError> {
        let provider = self
            .providers
            .get(kind)
            .ok_or_else(|| WalletError::UnknownProvider(kind.name().to_string()))?;

        {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Connecting | SessionState::Disconnecting => {
                    return Err(WalletError::ConnectionInProgress);
                }
                SessionState::Connected => {
                    let same = inner.provider.as_ref().map(|p| p.kind()) == Some(kind);
                    return match (same, inner.identity) {
                        (true, Some(identity)) => Ok(identity),
                        _ => Err(WalletError::Connection(
                            "Another wallet is already connected".to_string(),
                        )),
                    };
                }
                SessionState::Error(_) | SessionState::Disconnected => {}
            }
            inner.state = SessionState::Connecting;
            inner.provider = Some(provider.clone());
            inner.ever_attached = true;
            inner.detached = false;
        }
        debug!(provider = kind.name(), "Connecting wallet");

        let guard = ConnectGuard::new(&self.inner);
        let result = provider.connect().await;
        guard.finish();

        match result {
            Ok(identity) => {
                let mut inner = self.inner.lock();
                inner.state = SessionState::Connected;
                inner.identity = Some(identity);
                self.emit_edge(&mut inner);
                Ok(identity)
            }
            Err(e) => {
                warn!(provider = kind.name(), error = %e, "Wallet connection failed");
                let mut inner = self.inner.lock();
                inner.state = SessionState::Error(e.to_string());
                inner.identity = None;
                self.emit_edge(&mut inner);
                Err(e)
            }
        }
    }

    /// Detach the current provider.
    ///
    /// Provider-side errors are logged; the session still ends up `Disconnected` and
    /// stays detached even if the provider keeps reporting a public key.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let provider = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Connected => {}
                SessionState::Connecting | SessionState::Disconnecting => {
                    return Err(WalletError::ConnectionInProgress);
                }
                SessionState::Error(_) => {
                    inner.state = SessionState::Disconnected;
                    inner.detached = true;
                    return Ok(());
                }
                SessionState::Disconnected => return Ok(()),
            }
            inner.state = SessionState::Disconnecting;
            inner.detached = true;
            inner.provider.clone()
        };

        if let Some(provider) = provider {
            if let Err(e) = provider.disconnect().await {
                warn!(provider = provider.kind().name(), error = %e, "Provider disconnect failed");
            }
        }

        let mut inner = self.inner.lock();
        inner.state = SessionState::Disconnected;
        inner.identity = None;
        self.emit_edge(&mut inner);
        Ok(())
    }

    /// Connect if disconnected, disconnect if connected.
    pub async fn toggle(&self, kind: ProviderKind) -> Result<Option<Pubkey>, WalletError> {
        if self.is_connected() {
            self.disconnect().await.map(|_| None)
        } else {
            self.connect(kind).await.map(Some)
        }
    }

    /// Attach the remembered provider when auto-connect is enabled.
    ///
    /// Returns `Ok(None)` when nothing was attempted.
    pub async fn auto_connect(&self, config: &SettleConfig) -> Result<Option<Pubkey>, WalletError> {
        if !config.auto_connect {
            return Ok(None);
        }
        let Some(name) = config.wallet_provider.as_deref() else {
            return Ok(None);
        };
        let Some(kind) = ProviderKind::from_name(name) else {
            warn!(provider = name, "Remembered wallet provider is not known");
            return Ok(None);
        };
        if self.providers.get(kind).is_none() {
            warn!(provider = name, "Remembered wallet provider is not registered");
            return Ok(None);
        }
        self.connect(kind).await.map(Some)
    }

    /// Re-read the attached provider's own connection flag.
    ///
    /// Picks up disconnects (or reconnects) initiated on the wallet side. Edges fire only
    /// if the connected flag actually changed since the last one.
    pub fn refresh(&self) {
        let mut inner = self.inner.lock();
        let Some(provider) = inner.provider.clone() else {
            return;
        };
        match inner.state {
            SessionState::Connected if !provider.is_connected() => {
                info!(provider = provider.kind().name(), "Wallet dropped the connection");
                inner.state = SessionState::Disconnected;
                inner.identity = None;
            }
            SessionState::Disconnected if !inner.detached => {
                if let Some(identity) = provider.public_key() {
                    inner.state = SessionState::Connected;
                    inner.identity = Some(identity);
                }
            }
            SessionState::Connected => {
                // account switched inside the wallet
                let current = provider.public_key();
                if current.is_some() && current != inner.identity {
                    debug!("Wallet identity changed");
                    inner.identity = current;
                    self.fee_tiers.clear();
                }
            }
            _ => {}
        }
        self.emit_edge(&mut inner);
    }

    // endregion: --- Transitions

    /// Ask the attached provider to sign a batch in one pass.
    pub async fn sign_transactions(&self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>, WalletError> {
        let provider = {
            let inner = self.inner.lock();
            if inner.state != SessionState::Connected {
                return Err(WalletError::NotConnected);
            }
            inner.provider.clone().ok_or(WalletError::NotConnected)?
        };
        let expected = transactions.len();
        let signed = provider.sign_all_transactions(transactions).await?;
        if signed.len() != expected {
            return Err(WalletError::Signing(format!(
                "Provider returned {} signed transactions for {} requested",
                signed.len(),
                expected
            )));
        }
        Ok(signed)
    }

    /// Fire the edge implied by the current state, if the connected flag flipped.
    fn emit_edge(&self, inner: &mut SessionInner) {
        let connected = inner.state == SessionState::Connected;
        if connected == inner.reported_connected {
            return;
        }
        inner.reported_connected = connected;

        let event = match (connected, inner.identity) {
            (true, Some(identity)) => {
                let display = shared::display_identity(&identity.to_string());
                info!(identity = %identity, "Wallet connected");
                self.notifier.notify(Notification::info(
                    "Wallet update",
                    format!("Connected to wallet {}", display),
                ));
                WalletEvent::Connected { identity, display }
            }
            _ => {
                info!("Wallet disconnected");
                self.fee_tiers.clear();
                self.notifier
                    .notify(Notification::info("Wallet update", "Disconnected from wallet"));
                WalletEvent::Disconnected
            }
        };
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}
