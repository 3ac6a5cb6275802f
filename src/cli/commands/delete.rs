//! `keeper delete` — remove a secret from the cache, and optionally the server.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{client_config, load_settings, open_cache, resolve_credential, Cli};
use crate::errors::{KeeperError, Result};
use crate::secrets::{validate_secret_name, SecretType};
use crate::transport::{self, RemoteTransport};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, kind: &str, name: &str, remote: bool, force: bool) -> Result<()> {
    let kind: SecretType = kind.parse()?;
    validate_secret_name(name)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let target = if remote { " (cache and server)" } else { "" };
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {kind} '{name}'{target}?"))
            .default(false)
            .interact()
            .map_err(|e| KeeperError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let settings = load_settings(cli)?;
    let config = client_config(cli, &settings)?;

    // Server first: a failed remote delete leaves the local copy to retry from.
    if remote {
        let credential = resolve_credential(cli, &config)?;
        transport::connect(&config).delete(kind, name, &credential)?;
    }

    let cache = open_cache(cli, &settings, &config)?;
    let removed = cache.delete(kind, name)?;

    match (removed, remote) {
        (true, true) => output::success(&format!("Deleted {kind} '{name}' locally and on the server")),
        (true, false) => output::success(&format!("Deleted {kind} '{name}'")),
        (false, true) => output::success(&format!(
            "Deleted {kind} '{name}' on the server (it was not cached)"
        )),
        (false, false) => output::info(&format!("No {kind} named '{name}' in the local cache")),
    }

    Ok(())
}
