//! Cryptographic primitives for keeper.
//!
//! This module provides:
//! - Envelope encryption of secrets (`envelope`)
//! - RSA key loading and generation (`keys`)
//!
//! The AES-256-GCM layer (`encryption`) is private to the crate so the
//! only way to encrypt is through `envelope::encrypt`, which always
//! uses a fresh key and nonce.

mod encryption;
pub mod envelope;
pub mod keys;

pub use envelope::{decrypt, encrypt, Envelope};
pub use keys::{generate_key_pair, write_key_pair, OwnerKey, RecipientKey};
