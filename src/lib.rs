//! keeper: a personal secrets client.
//!
//! Secrets live in a local SQLite cache in plaintext columns and travel to
//! the server only as envelopes (AES-256-GCM content, RSA-OAEP wrapped
//! key).  `sync` pushes cached secrets according to a conflict strategy;
//! `pull` brings newer server copies back.

pub mod cache;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod logging;
pub mod resolver;
pub mod secrets;
pub mod sync;
pub mod transport;

#[cfg(feature = "keyring-store")]
pub mod keyring;
