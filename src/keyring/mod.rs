//! OS keyring integration for the bearer token.
//!
//! Stores and retrieves the server token from the operating system's
//! secure credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! If the keyring is unavailable the error is returned and the caller
//! falls back to `--token` / `KEEPER_TOKEN`.

use crate::errors::{KeeperError, Result};

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "keeper";

/// One entry per (server, owner) pair.
fn entry_key(server_url: &str, owner: &str) -> String {
    format!("token:{owner}@{}", server_url.trim_end_matches('/'))
}

fn entry(server_url: &str, owner: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, &entry_key(server_url, owner))
        .map_err(|e| KeeperError::KeyringError(format!("failed to create keyring entry: {e}")))
}

/// Store a bearer token for `owner` on `server_url`.
pub fn store_token(server_url: &str, owner: &str, token: &str) -> Result<()> {
    entry(server_url, owner)?
        .set_password(token)
        .map_err(|e| KeeperError::KeyringError(format!("failed to store token in keyring: {e}")))
}

/// Retrieve the stored token, or `None` if there is none.
pub fn get_token(server_url: &str, owner: &str) -> Result<Option<String>> {
    match entry(server_url, owner)?.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(KeeperError::KeyringError(format!(
            "failed to read from keyring: {e}"
        ))),
    }
}

/// Remove a stored token.  Removing a missing token succeeds.
pub fn delete_token(server_url: &str, owner: &str) -> Result<()> {
    match entry(server_url, owner)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(KeeperError::KeyringError(format!(
            "failed to delete from keyring: {e}"
        ))),
    }
}
