//! `keeper auth` — keep the bearer token in the OS keyring.
//!
//! Subcommands:
//! - `keeper auth save-token`   — store `--token` / `KEEPER_TOKEN` (or a prompt)
//! - `keeper auth forget-token` — remove the stored token
//!
//! When the keyring feature is not compiled in, both return an error.

use crate::cli::output;
use crate::cli::Cli;
use crate::errors::{KeeperError, Result};

/// Execute `keeper auth save-token`.
pub fn execute_save(cli: &Cli) -> Result<()> {
    #[cfg(feature = "keyring-store")]
    {
        let settings = crate::cli::load_settings(cli)?;
        let config = crate::cli::client_config(cli, &settings)?;

        let token = match cli.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => zeroize::Zeroizing::new(token.to_string()),
            None => crate::cli::prompt_hidden("Bearer token")?,
        };
        if token.trim().is_empty() {
            return Err(KeeperError::MissingCredential);
        }

        crate::keyring::store_token(&config.server_url, &config.owner, token.trim())?;
        output::success(&format!(
            "Token for '{}' on {} saved to OS keyring.",
            config.owner, config.server_url
        ));
        Ok(())
    }

    #[cfg(not(feature = "keyring-store"))]
    {
        let _ = cli;
        Err(keyring_disabled())
    }
}

/// Execute `keeper auth forget-token`.
pub fn execute_forget(cli: &Cli) -> Result<()> {
    #[cfg(feature = "keyring-store")]
    {
        let settings = crate::cli::load_settings(cli)?;
        let config = crate::cli::client_config(cli, &settings)?;
        crate::keyring::delete_token(&config.server_url, &config.owner)?;
        output::success("Token removed from OS keyring.");
        Ok(())
    }

    #[cfg(not(feature = "keyring-store"))]
    {
        let _ = cli;
        Err(keyring_disabled())
    }
}

#[cfg(not(feature = "keyring-store"))]
fn keyring_disabled() -> KeeperError {
    output::tip("Pass --token or set KEEPER_TOKEN instead.");
    KeeperError::KeyringError(
        "keyring support not compiled — rebuild with `cargo build --features keyring-store`".into(),
    )
}
