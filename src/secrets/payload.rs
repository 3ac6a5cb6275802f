//! The four payload shapes.

use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{SecretPayload, SecretType};

/// Longest text preview shown when resolving a conflict.
const TEXT_PREVIEW_CHARS: usize = 40;

/// Mask everything but the last four characters.
fn mask_tail(value: &str) -> String {
    let chars: Vec<char> = value.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{visible}", "*".repeat(chars.len() - 4))
}

/// A payment card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankCard {
    pub number: String,
    pub card_holder: String,
    /// Expiry as printed on the card, e.g. `12/27`.
    pub expiry: String,
    pub cvv: String,
}

impl SecretPayload for BankCard {
    const KIND: SecretType = SecretType::BankCard;
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("number", "TEXT NOT NULL"),
        ("card_holder", "TEXT NOT NULL"),
        ("expiry", "TEXT NOT NULL"),
        ("cvv", "TEXT NOT NULL"),
    ];

    fn to_columns(&self) -> Vec<Value> {
        vec![
            Value::Text(self.number.clone()),
            Value::Text(self.card_holder.clone()),
            Value::Text(self.expiry.clone()),
            Value::Text(self.cvv.clone()),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            number: row.get(offset)?,
            card_holder: row.get(offset + 1)?,
            expiry: row.get(offset + 2)?,
            cvv: row.get(offset + 3)?,
        })
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("number", mask_tail(&self.number)),
            ("holder", self.card_holder.clone()),
            ("expiry", self.expiry.clone()),
            ("cvv", "***".to_string()),
        ]
    }
}

/// Free-form text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
}

impl SecretPayload for Text {
    const KIND: SecretType = SecretType::Text;
    const COLUMNS: &'static [(&'static str, &'static str)] = &[("content", "TEXT NOT NULL")];

    fn to_columns(&self) -> Vec<Value> {
        vec![Value::Text(self.content.clone())]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            content: row.get(offset)?,
        })
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let total = self.content.chars().count();
        let preview = if total > TEXT_PREVIEW_CHARS {
            let head: String = self.content.chars().take(TEXT_PREVIEW_CHARS).collect();
            format!("{head}… ({total} chars)")
        } else {
            self.content.clone()
        };
        vec![("content", preview)]
    }
}

/// Arbitrary bytes, e.g. a key file or a scanned document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    #[serde(with = "crate::crypto::envelope::b64")]
    pub data: Vec<u8>,
}

impl SecretPayload for Binary {
    const KIND: SecretType = SecretType::Binary;
    const COLUMNS: &'static [(&'static str, &'static str)] = &[("data", "BLOB NOT NULL")];

    fn to_columns(&self) -> Vec<Value> {
        vec![Value::Blob(self.data.clone())]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            data: row.get(offset)?,
        })
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let digest = Sha256::digest(&self.data);
        let fingerprint: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
        vec![
            ("size", format!("{} bytes", self.data.len())),
            ("sha256", fingerprint),
        ]
    }
}

/// A username/password pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl SecretPayload for Credentials {
    const KIND: SecretType = SecretType::Credentials;
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("username", "TEXT NOT NULL"),
        ("password", "TEXT NOT NULL"),
    ];

    fn to_columns(&self) -> Vec<Value> {
        vec![
            Value::Text(self.username.clone()),
            Value::Text(self.password.clone()),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            username: row.get(offset)?,
            password: row.get(offset + 1)?,
        })
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("username", self.username.clone()),
            ("password", "*".repeat(self.password.chars().count().min(12))),
        ]
    }
}
