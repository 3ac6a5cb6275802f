//! Reconciliation between the local cache and the remote store.
//!
//! One `run` handles one secret type, strictly in cache order: fetch
//! the server copy, let the resolver decide, push if told to.  Server
//! copies are only decrypted when an interactive conflict is shown.  The first
//! unresolved conflict aborts the run; pushes already made stay in
//! place, and re-running is safe since `save` is a full replace.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SecretCache;
use crate::crypto::{OwnerKey, RecipientKey};
use crate::errors::{KeeperError, Result};
use crate::resolver::{
    decide, Action, ChoiceProvider, ConflictView, RemoteVersion, ResolutionStrategy,
};
use crate::secrets::{
    validate_secret_name, BankCard, Binary, Credentials, SecretPayload, SecretRecord, SecretType,
    Text,
};
use crate::transport::{wire, Credential, RemoteSecret, RemoteTransport};

/// Caller-controlled stop signal: a shared cancellation flag plus an
/// optional deadline.
///
/// Clones share the flag, so a token handed to a signal handler or a
/// watchdog thread stops the run it was cloned from.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// `Err(Cancelled)` once the token has tripped.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(KeeperError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A server copy that stays sealed unless a conflict has to be shown.
struct SealedRemote<'k> {
    secret: RemoteSecret,
    key: &'k OwnerKey,
}

impl<P: SecretPayload> RemoteVersion<P> for SealedRemote<'_> {
    fn updated_at(&self) -> DateTime<Utc> {
        self.secret.updated_at
    }

    fn open(&self) -> Result<SecretRecord<P>> {
        wire::open::<P>(&self.secret, self.key)
    }
}

/// Outcome of one push run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub kind: SecretType,
    pub pushed: Vec<String>,
    pub skipped: Vec<String>,
}

impl SyncReport {
    fn new(kind: SecretType) -> Self {
        Self {
            kind,
            pushed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Outcome of one pull run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReport {
    pub kind: SecretType,
    /// Names written to the cache.
    pub merged: Vec<String>,
    /// Names where the cache already held an equal or newer version.
    pub unchanged: Vec<String>,
}

/// Drives sync between one owner's cache and the remote store.
pub struct Reconciler<'a> {
    cache: &'a SecretCache,
    transport: &'a dyn RemoteTransport,
    credential: &'a Credential,
    recipient: &'a RecipientKey,
    owner_key: &'a OwnerKey,
    strategy: ResolutionStrategy,
    cancel: CancelToken,
}

impl<'a> Reconciler<'a> {
    /// A reconciler using the server-wins strategy and no cancellation.
    ///
    /// `recipient` seals outgoing secrets; `owner_key` opens server copies.
    pub fn new(
        cache: &'a SecretCache,
        transport: &'a dyn RemoteTransport,
        credential: &'a Credential,
        recipient: &'a RecipientKey,
        owner_key: &'a OwnerKey,
    ) -> Self {
        Self {
            cache,
            transport,
            credential,
            recipient,
            owner_key,
            strategy: ResolutionStrategy::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    /// Push every cached secret of type `P` that the strategy allows.
    pub fn run<P: SecretPayload>(&self, provider: &mut dyn ChoiceProvider) -> Result<SyncReport> {
        let locals = self.cache.list::<P>()?;
        let mut report = SyncReport::new(P::KIND);
        info!(kind = %P::KIND, count = locals.len(), strategy = %self.strategy, "sync started");

        for local in locals {
            self.cancel.check()?;
            let remote = self
                .transport
                .get(P::KIND, &local.secret_name, self.credential)?
                .map(|secret| SealedRemote {
                    secret,
                    key: self.owner_key,
                });

            let cancel = &self.cancel;
            let mut guarded = |view: &ConflictView| -> Result<String> {
                cancel.check()?;
                provider.choose(view)
            };

            match decide(&local, remote.as_ref(), self.strategy, &mut guarded) {
                Action::Push(record) => {
                    self.cancel.check()?;
                    let sealed = wire::seal(&record, self.recipient)?;
                    self.transport.save(P::KIND, &sealed, self.credential)?;
                    debug!(kind = %P::KIND, name = %record.secret_name, "pushed");
                    report.pushed.push(record.secret_name);
                }
                Action::Skip => {
                    debug!(kind = %P::KIND, name = %local.secret_name, "skipped");
                    report.skipped.push(local.secret_name);
                }
                Action::AskFailed(err) => {
                    warn!(kind = %P::KIND, name = %local.secret_name, "conflict left unresolved");
                    return Err(err);
                }
            }
        }

        info!(
            kind = %P::KIND,
            pushed = report.pushed.len(),
            skipped = report.skipped.len(),
            "sync finished"
        );
        Ok(report)
    }

    /// `run` for a type chosen at runtime.
    pub fn run_kind(
        &self,
        kind: SecretType,
        provider: &mut dyn ChoiceProvider,
    ) -> Result<SyncReport> {
        match kind {
            SecretType::BankCard => self.run::<BankCard>(provider),
            SecretType::Text => self.run::<Text>(provider),
            SecretType::Binary => self.run::<Binary>(provider),
            SecretType::Credentials => self.run::<Credentials>(provider),
        }
    }

    /// Fetch every remote secret of type `P` into the cache.
    ///
    /// A remote version only replaces a cached one when it is strictly newer.
    pub fn pull<P: SecretPayload>(&self) -> Result<PullReport> {
        self.cancel.check()?;
        let remotes = self.transport.list(P::KIND, self.credential)?;
        let mut report = PullReport {
            kind: P::KIND,
            merged: Vec::new(),
            unchanged: Vec::new(),
        };

        for remote in remotes {
            self.cancel.check()?;
            if remote.secret_owner != self.cache.owner() {
                warn!(
                    kind = %P::KIND,
                    name = %remote.secret_name,
                    "ignoring remote secret of another owner"
                );
                continue;
            }
            if validate_secret_name(&remote.secret_name).is_err() {
                warn!(
                    kind = %P::KIND,
                    name = ?remote.secret_name,
                    "ignoring remote secret with an invalid name"
                );
                continue;
            }
            let record = wire::open::<P>(&remote, self.owner_key)?;
            if self.cache.merge_remote(&record)? {
                report.merged.push(record.secret_name);
            } else {
                report.unchanged.push(record.secret_name);
            }
        }

        info!(
            kind = %P::KIND,
            merged = report.merged.len(),
            unchanged = report.unchanged.len(),
            "pull finished"
        );
        Ok(report)
    }

    /// `pull` for a type chosen at runtime.
    pub fn pull_kind(&self, kind: SecretType) -> Result<PullReport> {
        match kind {
            SecretType::BankCard => self.pull::<BankCard>(),
            SecretType::Text => self.pull::<Text>(),
            SecretType::Binary => self.pull::<Binary>(),
            SecretType::Credentials => self.pull::<Credentials>(),
        }
    }
}
