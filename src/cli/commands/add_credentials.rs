//! `keeper add-credentials` — store a login in the local cache.

use crate::cli::output;
use crate::cli::{prompt_hidden, store_secret, Cli};
use crate::errors::{KeeperError, Result};
use crate::secrets::Credentials;

/// Execute the `add-credentials` command.
pub fn execute(
    cli: &Cli,
    name: &str,
    username: &str,
    password: Option<&str>,
    meta: Option<&str>,
) -> Result<()> {
    if username.trim().is_empty() {
        return Err(KeeperError::CommandFailed("username cannot be empty".into()));
    }

    let password = match password {
        Some(p) => {
            output::warning("Password provided on command line — it may appear in shell history.");
            p.to_string()
        }
        None => prompt_hidden(&format!("Password for {username}"))?.to_string(),
    };

    let credentials = Credentials {
        username: username.trim().to_string(),
        password,
    };
    store_secret(cli, name, credentials, meta)
}
