//! AES-256-GCM authenticated encryption under a single-use content key.
//!
//! A `ContentKey` can only be minted from the OS random source, and
//! `seal` draws a fresh random 12-byte nonce on every call, which it
//! prepends to the ciphertext.  `open` splits the nonce back out.
//!
//! Layout of the sealed byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! Nothing here is public outside the crate: callers go through
//! `crypto::envelope`, which never lets a content key be reused.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::TryRngCore;
use zeroize::Zeroize;

use crate::errors::{KeeperError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub(crate) const NONCE_LEN: usize = 12;

/// Size of the content key in bytes (256 bits).
pub(crate) const KEY_LEN: usize = 32;

/// A 256-bit symmetric key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub(crate) struct ContentKey {
    bytes: [u8; KEY_LEN],
}

impl ContentKey {
    /// Draw a fresh key from the operating system's randomness source.
    pub(crate) fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| KeeperError::KeyGeneration(format!("OS randomness unavailable: {e}")))?;
        Ok(Self { bytes })
    }

    /// Rebuild a key recovered from a wrapped envelope.
    ///
    /// Rejects anything that is not exactly 32 bytes.
    pub(crate) fn from_unwrapped(mut raw: Vec<u8>) -> Result<Self> {
        if raw.len() != KEY_LEN {
            raw.zeroize();
            return Err(KeeperError::Unwrap);
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&raw);
        raw.zeroize();
        Ok(Self { bytes })
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// Encrypt `plaintext` under `key` with a freshly generated nonce.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub(crate) fn seal(key: &ContentKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| KeeperError::KeyGeneration(format!("invalid content key: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| KeeperError::KeyGeneration(format!("OS randomness unavailable: {e}")))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| KeeperError::AuthenticationFailure)?;

    // Prepend the nonce so the envelope only carries one blob.
    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `seal`.
///
/// Any failure (short input, bad tag, wrong key) is reported as
/// `AuthenticationFailure` and no partial plaintext is returned.
pub(crate) fn open(key: &ContentKey, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        return Err(KeeperError::AuthenticationFailure);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| KeeperError::AuthenticationFailure)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| KeeperError::AuthenticationFailure)
}
