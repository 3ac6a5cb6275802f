//! Envelope encryption: AES-256-GCM content + RSA-OAEP key wrapping.
//!
//! `encrypt` mints a new 256-bit content key and nonce for every call,
//! seals the plaintext, then wraps the content key for one recipient
//! with RSA-OAEP (SHA-256, fixed label).  `decrypt` reverses both steps.
//!
//! The ciphertext and the wrapped key only mean something together, so
//! they travel as one `Envelope`.

use std::fmt;

use rsa::rand_core::OsRng;
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::encryption::{self, ContentKey};
use super::keys::{OwnerKey, RecipientKey};
use crate::errors::{KeeperError, Result};

/// OAEP label binding wrapped keys to this envelope format.
pub const OAEP_LABEL: &str = "keeper-envelope-v1";

/// One sealed secret: AEAD ciphertext plus its wrapped content key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// `nonce || ciphertext || tag` (base64 in JSON).
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,

    /// The content key encrypted for the recipient (base64 in JSON).
    #[serde(with = "b64")]
    pub wrapped_key: Vec<u8>,
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("wrapped_key_len", &self.wrapped_key.len())
            .finish()
    }
}

fn oaep() -> Oaep {
    Oaep::new_with_label::<Sha256, _>(OAEP_LABEL)
}

/// Seal `plaintext` for `recipient`.
pub fn encrypt(plaintext: &[u8], recipient: &RecipientKey) -> Result<Envelope> {
    let content_key = ContentKey::generate()?;
    let ciphertext = encryption::seal(&content_key, plaintext)?;

    let wrapped_key = recipient
        .as_rsa()
        .encrypt(&mut OsRng, oaep(), content_key.as_bytes())
        .map_err(|e| KeeperError::AsymmetricWrap(e.to_string()))?;

    Ok(Envelope {
        ciphertext,
        wrapped_key,
    })
}

/// Open an envelope with the owner's private key.
///
/// Fails with `Unwrap` if the key cannot be unwrapped and with
/// `AuthenticationFailure` if the ciphertext does not verify.
pub fn decrypt(envelope: &Envelope, owner: &OwnerKey) -> Result<Vec<u8>> {
    let raw_key = owner
        .as_rsa()
        .decrypt(oaep(), &envelope.wrapped_key)
        .map_err(|_| KeeperError::Unwrap)?;
    let content_key = ContentKey::from_unwrapped(raw_key)?;

    encryption::open(&content_key, &envelope.ciphertext)
}

/// Serde helpers for base64-encoded `Vec<u8>` fields.
pub(crate) mod b64 {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(data))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(&s).map_err(serde::de::Error::custom)
    }
}
