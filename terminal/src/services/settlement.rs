//! # Settlement Orchestrator
//!
//! Moves unsettled balances out of every active venue in one user action.
//!
//! ## Attempt lifecycle
//!
//! ```text
//! Idle ─▶ Validating ─▶ Building ─▶ Signing ─▶ Submitting ─▶ Confirming ─▶ Completed
//!              │            │           │
//!              └────────────┴───────────┴──────────────▶ Failed
//! ```
//!
//! - **Validating**: wallet connected, token accounts loaded, markets loaded. A missing
//!   dependency aborts before anything is built.
//! - **Building**: one instruction set per venue with free funds. Venues with nothing to
//!   settle are skipped; venues that cannot be built are recorded and left out.
//! - **Signing**: venues are packed greedily into transactions and the whole batch goes to
//!   the wallet in a single approval pass. A rejection aborts the attempt with nothing sent.
//! - **Submitting / Confirming**: transactions are sent and confirmed concurrently; a
//!   failure only affects the venues packed into that transaction.
//!
//! Only one attempt runs at a time. A request made while another is between
//! `Validating` and `Confirming` is rejected with [`SettleError::Busy`].

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::core::service::{ConnectionClient, MarketRegistry, Notifier, TokenAccountsProvider};
use crate::services::accounts::TokenAccount;
use crate::services::markets::Market;
use crate::services::notify::{Notification, NotificationKind};
use crate::services::selection::TokenAccountSelectionStore;
use crate::services::session::WalletSessionManager;
use crate::services::wallet::WalletError;

/// Notification title for every settlement failure.
pub const SETTLE_ERROR_MESSAGE: &str = "Error settling funds";

/// Default bound on instructions packed into one transaction.
pub const DEFAULT_MAX_INSTRUCTIONS_PER_TX: usize = 12;

const NO_DESTINATION: &str = "no destination account";

// region: --- Errors

/// A dependency the attempt could not start without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dependency {
    Wallet,
    TokenAccounts,
    Markets,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Wallet => write!(f, "Wallet not connected"),
            Dependency::TokenAccounts => write!(f, "TokenAccounts not connected"),
            Dependency::Markets => write!(f, "Markets not connected"),
        }
    }
}

/// Failures that stop an attempt as a whole.
#[derive(Debug, Error)]
pub enum SettleError {
    #[error("{0}")]
    Precondition(Dependency),
    #[error("Settlement already in progress")]
    Busy,
    #[error("{0}")]
    Signing(#[source] WalletError),
    #[error("RPC error: {0}")]
    Rpc(String),
}

// endregion: --- Errors

// region: --- Outcomes

/// Where an attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettlementPhase {
    Idle,
    Validating,
    Building,
    Signing,
    Submitting,
    Confirming,
    Completed,
    Failed,
}

impl SettlementPhase {
    /// An attempt is outstanding.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SettlementPhase::Validating
                | SettlementPhase::Building
                | SettlementPhase::Signing
                | SettlementPhase::Submitting
                | SettlementPhase::Confirming
        )
    }
}

/// Network failure after signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    Submission(String),
    Confirmation { signature: Signature, reason: String },
}

impl fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitFailure::Submission(reason) => write!(f, "Submission failed: {}", reason),
            SubmitFailure::Confirmation { signature, reason } => {
                write!(f, "Confirmation of {} failed: {}", signature, reason)
            }
        }
    }
}

/// Result for a single venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueOutcome {
    Settled { signature: Signature },
    /// Nothing free on either leg
    Skipped,
    BuildError(String),
    SubmitError(SubmitFailure),
}

#[derive(Debug, Clone)]
pub struct VenueSettlement {
    pub market: Market,
    pub outcome: VenueOutcome,
}

/// Venues packed into one transaction.
#[derive(Debug, Clone)]
pub struct SettlementBatch {
    pub markets: Vec<Pubkey>,
    pub instruction_count: usize,
    pub result: Result<Signature, SubmitFailure>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettlementSummary {
    pub settled: usize,
    pub skipped: usize,
    pub build_errors: usize,
    pub submit_errors: usize,
}

impl SettlementSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a VenueOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome {
                VenueOutcome::Settled { .. } => summary.settled += 1,
                VenueOutcome::Skipped => summary.skipped += 1,
                VenueOutcome::BuildError(_) => summary.build_errors += 1,
                VenueOutcome::SubmitError(_) => summary.submit_errors += 1,
            }
        }
        summary
    }

    /// Venues that reached the network.
    pub fn attempted(&self) -> usize {
        self.settled + self.submit_errors
    }

    pub fn has_failures(&self) -> bool {
        self.build_errors + self.submit_errors > 0
    }

    fn notification(&self) -> Notification {
        if self.attempted() == 0 && !self.has_failures() {
            return Notification::info("Settle funds", "Nothing to settle");
        }
        let description = format!(
            "{} settled, {} skipped, {} failed to build, {} failed to submit",
            self.settled, self.skipped, self.build_errors, self.submit_errors
        );
        if self.settled == 0 {
            Notification::error(SETTLE_ERROR_MESSAGE, description)
        } else if self.has_failures() {
            Notification::new("Funds partially settled", description, NotificationKind::Warning)
        } else {
            Notification::new("Funds settled", description, NotificationKind::Success)
        }
    }
}

/// Everything one attempt produced. Not persisted.
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub attempt_id: Uuid,
    pub owner: Pubkey,
    pub venues: Vec<VenueSettlement>,
    pub batches: Vec<SettlementBatch>,
    pub summary: SettlementSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SettlementReport {
    pub fn outcome_for(&self, market: &Pubkey) -> Option<&VenueOutcome> {
        self.venues
            .iter()
            .find(|v| v.market.address == *market)
            .map(|v| &v.outcome)
    }
}

// endregion: --- Outcomes

/// Marks the attempt `Failed` unless it finished, so a dropped future never leaves the
/// orchestrator busy. An interrupted attempt is reported through the notifier.
struct AttemptGuard<'a> {
    phase: &'a Mutex<SettlementPhase>,
    notifier: &'a dyn Notifier,
    finished: bool,
}

impl AttemptGuard<'_> {
    fn enter(&self, phase: SettlementPhase) {
        debug!(?phase, "Settlement phase");
        *self.phase.lock() = phase;
    }

    fn finish(mut self, phase: SettlementPhase) {
        *self.phase.lock() = phase;
        self.finished = true;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let reached = std::mem::replace(&mut *self.phase.lock(), SettlementPhase::Failed);
        warn!(phase = ?reached, "Settlement attempt dropped before completion");
        let description = match reached {
            SettlementPhase::Submitting | SettlementPhase::Confirming => format!(
                "Settlement interrupted during {:?}; some transactions may have landed",
                reached
            ),
            _ => format!("Settlement interrupted during {:?}", reached),
        };
        self.notifier
            .notify(Notification::error(SETTLE_ERROR_MESSAGE, description));
    }
}

enum VenuePlan {
    Done(VenueOutcome),
    Settle(Vec<Instruction>),
}

pub struct SettlementOrchestrator {
    session: Arc<WalletSessionManager>,
    markets: Arc<dyn MarketRegistry>,
    accounts: Arc<dyn TokenAccountsProvider>,
    selections: Arc<TokenAccountSelectionStore>,
    connection: Arc<dyn ConnectionClient>,
    notifier: Arc<dyn Notifier>,
    max_instructions_per_tx: usize,
    phase: Mutex<SettlementPhase>,
}

impl SettlementOrchestrator {
    pub fn new(
        session: Arc<WalletSessionManager>,
        markets: Arc<dyn MarketRegistry>,
        accounts: Arc<dyn TokenAccountsProvider>,
        selections: Arc<TokenAccountSelectionStore>,
        connection: Arc<dyn ConnectionClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            markets,
            accounts,
            selections,
            connection,
            notifier,
            max_instructions_per_tx: DEFAULT_MAX_INSTRUCTIONS_PER_TX,
            phase: Mutex::new(SettlementPhase::Idle),
        }
    }

    pub fn with_max_instructions_per_tx(mut self, max: usize) -> Self {
        self.max_instructions_per_tx = max.max(1);
        self
    }

    pub fn phase(&self) -> SettlementPhase {
        *self.phase.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.phase().is_active()
    }

    /// Run the attempt on its own task.
    ///
    /// The task keeps going if the caller drops the handle; the report is then discarded.
    pub fn spawn_settle_all(self: &Arc<Self>) -> JoinHandle<Result<SettlementReport, SettleError>> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.settle_all().await })
    }

    /// Settle every active venue for the connected wallet.
    ///
    /// Dropping this future mid-attempt marks the attempt `Failed` and sends an
    /// "interrupted" notification, but transactions already submitted are not tracked.
    /// Callers that may go away before the attempt ends should use
    /// [`Self::spawn_settle_all`].
    pub async fn settle_all(&self) -> Result<SettlementReport, SettleError> {
        let guard = self.begin()?;
        let attempt_id = Uuid::new_v4();
        let span = info_span!("settle_all", attempt = %attempt_id);
        self.run(guard, attempt_id).instrument(span).await
    }

    fn begin(&self) -> Result<AttemptGuard<'_>, SettleError> {
        let mut phase = self.phase.lock();
        if phase.is_active() {
            drop(phase);
            warn!("Settlement requested while another attempt is running");
            self.notifier
                .notify(Notification::error(SETTLE_ERROR_MESSAGE, SettleError::Busy.to_string()));
            return Err(SettleError::Busy);
        }
        *phase = SettlementPhase::Validating;
        Ok(AttemptGuard {
            phase: &self.phase,
            notifier: self.notifier.as_ref(),
            finished: false,
        })
    }

    async fn run(&self, guard: AttemptGuard<'_>, attempt_id: Uuid) -> Result<SettlementReport, SettleError> {
        let started_at = Utc::now();

        // -- Validating
        let (owner, accounts, markets) = match self.validate() {
            Ok(ready) => ready,
            Err(dependency) => {
                warn!(%dependency, "Settlement precondition failed");
                return Err(self.fail(guard, SettleError::Precondition(dependency)));
            }
        };
        info!(owner = %owner, markets = markets.len(), "Settling funds");

        // -- Building
        guard.enter(SettlementPhase::Building);
        let mut plans = Vec::with_capacity(markets.len());
        for market in &markets {
            plans.push(self.plan_venue(market, &owner, &accounts).await);
        }

        let pending: Vec<(usize, usize)> = plans
            .iter()
            .enumerate()
            .filter_map(|(i, plan)| match plan {
                VenuePlan::Settle(ixs) => Some((i, ixs.len())),
                VenuePlan::Done(_) => None,
            })
            .collect();

        let mut batches = Vec::new();
        if !pending.is_empty() {
            let sizes: Vec<usize> = pending.iter().map(|(_, n)| *n).collect();
            let groups: Vec<Vec<usize>> = group_venues(&sizes, self.max_instructions_per_tx)
                .into_iter()
                .map(|group| group.into_iter().map(|p| pending[p].0).collect())
                .collect();

            // -- Signing
            guard.enter(SettlementPhase::Signing);
            let blockhash = match self.connection.latest_blockhash().await {
                Ok(hash) => hash,
                Err(e) => return Err(self.fail(guard, SettleError::Rpc(e.to_string()))),
            };
            let transactions: Vec<Transaction> = groups
                .iter()
                .map(|group| {
                    let instructions: Vec<Instruction> = group
                        .iter()
                        .flat_map(|&i| match &plans[i] {
                            VenuePlan::Settle(ixs) => ixs.clone(),
                            VenuePlan::Done(_) => Vec::new(),
                        })
                        .collect();
                    let mut tx = Transaction::new_with_payer(&instructions, Some(&owner));
                    tx.message.recent_blockhash = blockhash;
                    tx
                })
                .collect();
            debug!(transactions = transactions.len(), venues = pending.len(), "Requesting signatures");

            let signed = match self.session.sign_transactions(transactions).await {
                Ok(signed) => signed,
                Err(e) => {
                    warn!(error = %e, "Signing rejected, nothing submitted");
                    return Err(self.fail(guard, SettleError::Signing(e)));
                }
            };

            // -- Submitting
            guard.enter(SettlementPhase::Submitting);
            let sent = join_all(signed.iter().map(|tx| self.connection.send_transaction(tx))).await;

            // -- Confirming
            guard.enter(SettlementPhase::Confirming);
            let results: Vec<Result<Signature, SubmitFailure>> = join_all(sent.into_iter().map(|sent| async move {
                let signature = sent.map_err(|e| SubmitFailure::Submission(e.to_string()))?;
                self.connection
                    .confirm_transaction(&signature)
                    .await
                    .map_err(|e| SubmitFailure::Confirmation {
                        signature,
                        reason: e.to_string(),
                    })?;
                Ok::<_, SubmitFailure>(signature)
            }))
            .await;

            for ((group, result), tx) in groups.into_iter().zip(results).zip(&signed) {
                let outcome = match &result {
                    Ok(signature) => VenueOutcome::Settled { signature: *signature },
                    Err(failure) => {
                        warn!(error = %failure, venues = group.len(), "Settlement transaction failed");
                        VenueOutcome::SubmitError(failure.clone())
                    }
                };
                for &i in &group {
                    plans[i] = VenuePlan::Done(outcome.clone());
                }
                batches.push(SettlementBatch {
                    markets: group.iter().map(|&i| markets[i].address).collect(),
                    instruction_count: tx.message.instructions.len(),
                    result,
                });
            }
        }

        let venues: Vec<VenueSettlement> = markets
            .into_iter()
            .zip(plans)
            .map(|(market, plan)| VenueSettlement {
                market,
                outcome: match plan {
                    VenuePlan::Done(outcome) => outcome,
                    VenuePlan::Settle(_) => VenueOutcome::SubmitError(SubmitFailure::Submission(
                        "transaction was not sent".to_string(),
                    )),
                },
            })
            .collect();

        let summary = SettlementSummary::from_outcomes(venues.iter().map(|v| &v.outcome));
        info!(
            settled = summary.settled,
            skipped = summary.skipped,
            build_errors = summary.build_errors,
            submit_errors = summary.submit_errors,
            "Settlement finished"
        );
        self.notifier.notify(summary.notification());
        guard.finish(SettlementPhase::Completed);

        Ok(SettlementReport {
            attempt_id,
            owner,
            venues,
            batches,
            summary,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn validate(&self) -> Result<(Pubkey, Arc<Vec<TokenAccount>>, Vec<Market>), Dependency> {
        let owner = self
            .session
            .connected_identity()
            .map_err(|_| Dependency::Wallet)?;
        let accounts = self.accounts.snapshot().ok_or(Dependency::TokenAccounts)?;
        let markets = self.markets.markets().ok_or(Dependency::Markets)?;
        Ok((owner, accounts, markets))
    }

    async fn plan_venue(&self, market: &Market, owner: &Pubkey, accounts: &[TokenAccount]) -> VenuePlan {
        let balances = match self.markets.unsettled_balances(market, owner).await {
            Ok(balances) => balances,
            Err(e) => {
                warn!(market = %market.address, error = %e, "Could not read unsettled balances");
                return VenuePlan::Done(VenueOutcome::BuildError(e.to_string()));
            }
        };
        if balances.is_empty() {
            debug!(market = %market.name, "Nothing to settle");
            return VenuePlan::Done(VenueOutcome::Skipped);
        }

        let base = self.selections.selected_in(&market.base_mint, accounts);
        let quote = self.selections.selected_in(&market.quote_mint, accounts);
        let (Some(base), Some(quote)) = (base, quote) else {
            warn!(market = %market.name, "No destination account");
            return VenuePlan::Done(VenueOutcome::BuildError(NO_DESTINATION.to_string()));
        };

        match self.markets.settle_instructions(market, owner, &base, &quote).await {
            Ok(ixs) if ixs.is_empty() => VenuePlan::Done(VenueOutcome::Skipped),
            Ok(ixs) => VenuePlan::Settle(ixs),
            Err(e) => {
                warn!(market = %market.address, error = %e, "Could not build settle instructions");
                VenuePlan::Done(VenueOutcome::BuildError(e.to_string()))
            }
        }
    }

    fn fail(&self, guard: AttemptGuard<'_>, error: SettleError) -> SettleError {
        self.notifier
            .notify(Notification::error(SETTLE_ERROR_MESSAGE, error.to_string()));
        guard.finish(SettlementPhase::Failed);
        error
    }
}

/// Pack venue instruction sets into transactions, in order, without splitting a venue.
///
/// A venue larger than `max` gets a transaction of its own.
pub fn group_venues(sizes: &[usize], max: usize) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut filled = 0;
    for (i, &size) in sizes.iter().enumerate() {
        if !current.is_empty() && filled + size > max {
            groups.push(std::mem::take(&mut current));
            filled = 0;
        }
        current.push(i);
        filled += size;
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}
