//! Secret types and the per-type customization point.
//!
//! Sync, caching and encryption are identical for every kind of secret.
//! What differs is captured by `SecretPayload`: which table a payload
//! lives in, how its fields map to columns, and how it is shown to a
//! user resolving a conflict.  The wire form is the payload's serde JSON.

pub mod payload;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{KeeperError, Result};

pub use payload::{BankCard, Binary, Credentials, Text};

/// Longest accepted secret name.
const MAX_NAME_LEN: usize = 256;

/// The closed set of secret kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    BankCard,
    Text,
    Binary,
    #[serde(alias = "username_password")]
    Credentials,
}

impl SecretType {
    /// Every secret type, in sync order.
    pub const ALL: [SecretType; 4] = [
        SecretType::BankCard,
        SecretType::Text,
        SecretType::Binary,
        SecretType::Credentials,
    ];

    /// Stable identifier used in URLs, RPC params and the CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            SecretType::BankCard => "bank_card",
            SecretType::Text => "text",
            SecretType::Binary => "binary",
            SecretType::Credentials => "credentials",
        }
    }

    /// Cache table holding this type.
    pub fn table(self) -> &'static str {
        match self {
            SecretType::BankCard => "bank_cards",
            SecretType::Text => "texts",
            SecretType::Binary => "binaries",
            SecretType::Credentials => "credentials",
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretType {
    type Err = KeeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "bank_card" | "card" => Ok(SecretType::BankCard),
            "text" => Ok(SecretType::Text),
            "binary" => Ok(SecretType::Binary),
            "credentials" | "username_password" | "login" => Ok(SecretType::Credentials),
            other => Err(KeeperError::CommandFailed(format!(
                "unknown secret type '{other}' — expected bank_card, text, binary or credentials"
            ))),
        }
    }
}

/// Type-specific payload of a secret.
///
/// Implemented once per `SecretType`; everything else in the engine is
/// generic over this trait.
pub trait SecretPayload:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Which secret type this payload belongs to.
    const KIND: SecretType;

    /// Payload columns in the cache table, in `to_columns` order.
    const COLUMNS: &'static [(&'static str, &'static str)];

    /// Column values for an upsert.
    fn to_columns(&self) -> Vec<Value>;

    /// Rebuild the payload from a row, starting at column `offset`.
    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;

    /// Labelled, display-safe fields for showing this payload to a user.
    fn describe(&self) -> Vec<(&'static str, String)>;
}

/// A secret as held in the local cache.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretRecord<P> {
    pub secret_name: String,
    pub owner: String,
    pub payload: P,
    pub meta: Option<String>,
    /// Set by the cache on every write; the only ordering signal for sync.
    pub updated_at: DateTime<Utc>,
}

impl<P: SecretPayload> SecretRecord<P> {
    /// Build a new record stamped with the current time.
    pub fn new(secret_name: &str, owner: &str, payload: P, meta: Option<String>) -> Self {
        Self {
            secret_name: secret_name.to_string(),
            owner: owner.to_string(),
            payload,
            meta,
            updated_at: Utc::now(),
        }
    }

    /// The type of secret this record holds.
    pub fn kind(&self) -> SecretType {
        P::KIND
    }
}

/// Validate that a secret name is safe.
///
/// Allowed: ASCII letters, digits, underscores, hyphens, periods.
/// Must be non-empty and at most 256 characters, since names end up
/// as URL path segments.  `.` and `..` are rejected for the same reason.
pub fn validate_secret_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name.len() <= MAX_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.');
    if valid {
        Ok(())
    } else {
        Err(KeeperError::InvalidSecretName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_type_parses_aliases() {
        assert_eq!("bank-card".parse::<SecretType>().unwrap(), SecretType::BankCard);
        assert_eq!("CARD".parse::<SecretType>().unwrap(), SecretType::BankCard);
        assert_eq!("text".parse::<SecretType>().unwrap(), SecretType::Text);
        assert_eq!(
            "username_password".parse::<SecretType>().unwrap(),
            SecretType::Credentials
        );
        assert!("photo".parse::<SecretType>().is_err());
    }

    #[test]
    fn secret_type_display_roundtrips() {
        for kind in SecretType::ALL {
            assert_eq!(kind.to_string().parse::<SecretType>().unwrap(), kind);
        }
    }

    #[test]
    fn secret_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SecretType::BankCard).unwrap(),
            "\"bank_card\""
        );
    }

    #[test]
    fn valid_secret_names() {
        assert!(validate_secret_name("card1").is_ok());
        assert!(validate_secret_name("work.vpn-login_2").is_ok());
    }

    #[test]
    fn rejects_bad_secret_names() {
        assert!(validate_secret_name("").is_err());
        assert!(validate_secret_name("a/b").is_err());
        assert!(validate_secret_name("with space").is_err());
        assert!(validate_secret_name(&"x".repeat(257)).is_err());
    }

    #[test]
    fn rejects_dot_segments() {
        assert!(validate_secret_name(".").is_err());
        assert!(validate_secret_name("..").is_err());
        assert!(validate_secret_name("...").is_ok());
        assert!(validate_secret_name(".env").is_ok());
    }
}
