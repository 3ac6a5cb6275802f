//! Conflict resolution between a cached secret and its server copy.
//!
//! `decide` is pure: it compares timestamps, applies the strategy and,
//! for a genuine interactive conflict, asks an injected `ChoiceProvider`
//! which side to keep.  It never performs I/O of its own.
//!
//! The server copy is only opened for that interactive conflict; every
//! other row of the table needs nothing but its `updated_at`.
//!
//! | strategy    | remote absent | local newer | local not newer |
//! |-------------|---------------|-------------|-----------------|
//! | server      | skip          | skip        | skip            |
//! | client      | push          | push        | push            |
//! | interactive | push          | ask         | skip            |
//!
//! Equal timestamps count as "remote is at least as fresh".

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{KeeperError, Result};
use crate::secrets::{SecretPayload, SecretRecord, SecretType};

/// How conflicts are settled for one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    #[default]
    #[serde(alias = "server_wins")]
    Server,
    #[serde(alias = "client_wins")]
    Client,
    Interactive,
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolutionStrategy::Server => "server",
            ResolutionStrategy::Client => "client",
            ResolutionStrategy::Interactive => "interactive",
        })
    }
}

impl FromStr for ResolutionStrategy {
    type Err = KeeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" | "server-wins" | "server_wins" => Ok(ResolutionStrategy::Server),
            "client" | "client-wins" | "client_wins" => Ok(ResolutionStrategy::Client),
            "interactive" => Ok(ResolutionStrategy::Interactive),
            _ => Err(KeeperError::UnknownStrategy(s.trim().to_string())),
        }
    }
}

/// The user's answer to a conflict prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Keep the server's version (the default on empty input).
    Server,
    /// Overwrite the server with the local version.
    Client,
}

impl Choice {
    /// Parse an answer.  Empty input means "server"; anything other than
    /// `server` or `client` is `InvalidChoice`.
    pub fn parse(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "" | "server" => Ok(Choice::Server),
            "client" => Ok(Choice::Client),
            _ => Err(KeeperError::InvalidChoice(input.trim().to_string())),
        }
    }
}

/// One side of a conflict, prepared for display.
#[derive(Debug, Clone)]
pub struct VersionView {
    pub fields: Vec<(&'static str, String)>,
    pub meta: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl VersionView {
    fn of<P: SecretPayload>(record: &SecretRecord<P>) -> Self {
        Self {
            fields: record.payload.describe(),
            meta: record.meta.clone(),
            updated_at: record.updated_at,
        }
    }
}

/// Both versions of a conflicting secret, as shown to the user.
#[derive(Debug, Clone)]
pub struct ConflictView {
    pub secret_type: SecretType,
    pub secret_name: String,
    pub local: VersionView,
    pub remote: VersionView,
}

/// Supplies the user's answer when a conflict needs a human decision.
///
/// Returns the raw answer; `decide` parses it.
pub trait ChoiceProvider {
    fn choose(&mut self, conflict: &ConflictView) -> Result<String>;
}

impl<F> ChoiceProvider for F
where
    F: FnMut(&ConflictView) -> Result<String>,
{
    fn choose(&mut self, conflict: &ConflictView) -> Result<String> {
        self(conflict)
    }
}

/// Reads one line per conflict from any buffered reader, with no retry.
///
/// Used when stdin is not a terminal.
pub struct LineChoiceProvider<R> {
    reader: R,
}

impl<R: BufRead> LineChoiceProvider<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> ChoiceProvider for LineChoiceProvider<R> {
    fn choose(&mut self, _conflict: &ConflictView) -> Result<String> {
        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        Ok(line)
    }
}

/// A provider for runs that can never prompt.
///
/// Any conflict it is asked about fails with `InvalidChoice`.
pub struct NoPrompt;

impl ChoiceProvider for NoPrompt {
    fn choose(&mut self, conflict: &ConflictView) -> Result<String> {
        Err(KeeperError::InvalidChoice(format!(
            "<no prompt available for '{}'>",
            conflict.secret_name
        )))
    }
}

/// The server's version of a secret, as far as `decide` needs it.
///
/// `updated_at` must be available without decrypting anything; `open`
/// is called at most once, and only to show an interactive conflict.
pub trait RemoteVersion<P> {
    fn updated_at(&self) -> DateTime<Utc>;

    fn open(&self) -> Result<SecretRecord<P>>;
}

impl<P: SecretPayload> RemoteVersion<P> for SecretRecord<P> {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn open(&self) -> Result<SecretRecord<P>> {
        Ok(self.clone())
    }
}

/// What the reconciler should do with one local secret.
#[derive(Debug)]
pub enum Action<P> {
    /// Overwrite the server with this record.
    Push(SecretRecord<P>),
    /// Leave the server untouched.
    Skip,
    /// The conflict could not be shown or the user answered badly; abort the run.
    AskFailed(KeeperError),
}

impl<P> Action<P> {
    pub fn is_push(&self) -> bool {
        matches!(self, Action::Push(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Action::Skip)
    }
}

/// Decide what to do with `local` given the server's copy.
pub fn decide<P, R>(
    local: &SecretRecord<P>,
    remote: Option<&R>,
    strategy: ResolutionStrategy,
    provider: &mut dyn ChoiceProvider,
) -> Action<P>
where
    P: SecretPayload,
    R: RemoteVersion<P> + ?Sized,
{
    match (strategy, remote) {
        (ResolutionStrategy::Server, _) => Action::Skip,
        (ResolutionStrategy::Client, _) => Action::Push(local.clone()),
        (ResolutionStrategy::Interactive, None) => Action::Push(local.clone()),
        (ResolutionStrategy::Interactive, Some(remote)) => {
            if local.updated_at <= remote.updated_at() {
                return Action::Skip;
            }

            let opened = match remote.open() {
                Ok(opened) => opened,
                Err(err) => return Action::AskFailed(err),
            };
            let view = ConflictView {
                secret_type: P::KIND,
                secret_name: local.secret_name.clone(),
                local: VersionView::of(local),
                remote: VersionView::of(&opened),
            };
            let answer = match provider.choose(&view) {
                Ok(answer) => answer,
                Err(err) => return Action::AskFailed(err),
            };
            match Choice::parse(&answer) {
                Ok(Choice::Server) => Action::Skip,
                Ok(Choice::Client) => Action::Push(local.clone()),
                Err(err) => Action::AskFailed(err),
            }
        }
    }
}
