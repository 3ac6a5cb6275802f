//! Remote secret store contract and its adapters.
//!
//! The sync engine only depends on `RemoteTransport`.  Two adapters
//! implement it over different wire protocols (`http` and `rpc`), and
//! `retry` adds bounded backoff around either one.

pub mod http;
pub mod retry;
pub mod rpc;
pub mod wire;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::ClientConfig;
use crate::crypto::Envelope;
use crate::errors::{KeeperError, Result};
use crate::secrets::SecretType;

pub use http::HttpTransport;
pub use retry::Retrying;
pub use rpc::RpcTransport;

/// Opaque bearer token attached to every remote call.
///
/// Never validated or renewed here; wiped from memory on drop.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Value for an `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.0.as_str())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A secret as the remote store holds it: sealed, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSecret {
    pub secret_name: String,
    pub secret_type: SecretType,
    pub secret_owner: String,
    #[serde(flatten)]
    pub envelope: Envelope,
    /// Plaintext label travelling alongside the envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Get/List/Save/Delete against a remote secret store.
///
/// Every call carries the bearer credential out of band.  Absence on
/// `get` is `Ok(None)`; failures are `Unauthorized`, `Unavailable` or
/// `ServerError`, never stale data.
pub trait RemoteTransport {
    fn get(
        &self,
        kind: SecretType,
        secret_name: &str,
        credential: &Credential,
    ) -> Result<Option<RemoteSecret>>;

    fn save(&self, kind: SecretType, secret: &RemoteSecret, credential: &Credential) -> Result<()>;

    fn list(&self, kind: SecretType, credential: &Credential) -> Result<Vec<RemoteSecret>>;

    fn delete(&self, kind: SecretType, secret_name: &str, credential: &Credential) -> Result<()>;
}

impl<T: RemoteTransport + ?Sized> RemoteTransport for Box<T> {
    fn get(
        &self,
        kind: SecretType,
        secret_name: &str,
        credential: &Credential,
    ) -> Result<Option<RemoteSecret>> {
        (**self).get(kind, secret_name, credential)
    }

    fn save(&self, kind: SecretType, secret: &RemoteSecret, credential: &Credential) -> Result<()> {
        (**self).save(kind, secret, credential)
    }

    fn list(&self, kind: SecretType, credential: &Credential) -> Result<Vec<RemoteSecret>> {
        (**self).list(kind, credential)
    }

    fn delete(&self, kind: SecretType, secret_name: &str, credential: &Credential) -> Result<()> {
        (**self).delete(kind, secret_name, credential)
    }
}

/// Which wire protocol to talk to the server with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Http,
    Rpc,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Http => f.write_str("http"),
            TransportKind::Rpc => f.write_str("rpc"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = KeeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "rest" => Ok(TransportKind::Http),
            "rpc" | "jsonrpc" => Ok(TransportKind::Rpc),
            other => Err(KeeperError::ConfigError(format!(
                "unknown transport '{other}' — expected http or rpc"
            ))),
        }
    }
}

/// Build the configured adapter, wrapped in the retry policy.
pub fn connect(config: &ClientConfig) -> Box<dyn RemoteTransport> {
    match config.transport {
        TransportKind::Http => Box::new(Retrying::new(
            HttpTransport::new(&config.server_url, config.timeout),
            config.max_retries,
            config.retry_base_delay,
        )),
        TransportKind::Rpc => Box::new(Retrying::new(
            RpcTransport::new(&config.server_url, config.timeout),
            config.max_retries,
            config.retry_base_delay,
        )),
    }
}

/// Map an HTTP status to the transport error taxonomy.
pub(crate) fn status_error(status: u16, message: String) -> KeeperError {
    match status {
        401 | 403 => KeeperError::Unauthorized,
        503 => KeeperError::Unavailable(if message.is_empty() {
            "service unavailable".to_string()
        } else {
            message
        }),
        _ => KeeperError::ServerError {
            status: i32::from(status),
            message,
        },
    }
}

/// Map a ureq failure that happened before a status line arrived.
pub(crate) fn request_error(err: ureq::Error) -> KeeperError {
    let msg = err.to_string();
    match err {
        ureq::Error::StatusCode(code) => status_error(code, String::new()),
        ureq::Error::Io(_)
        | ureq::Error::Timeout(_)
        | ureq::Error::HostNotFound
        | ureq::Error::ConnectionFailed => KeeperError::Unavailable(msg),
        _ => KeeperError::Protocol(msg),
    }
}
