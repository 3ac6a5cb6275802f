//! `keeper pull` — bring newer server copies into the local cache.

use crate::cli::output;
use crate::cli::{
    client_config, load_settings, open_cache, owner_key, resolve_credential, selected_types, Cli,
};
use crate::errors::Result;
use crate::sync::Reconciler;
use crate::transport;

/// Execute the `pull` command.
pub fn execute(cli: &Cli, kind: Option<&str>) -> Result<()> {
    let kinds = selected_types(kind)?;
    let settings = load_settings(cli)?;
    let config = client_config(cli, &settings)?;
    let credential = resolve_credential(cli, &config)?;
    let owner = owner_key(&settings)?;
    let recipient = owner.recipient();
    let cache = open_cache(cli, &settings, &config)?;
    let remote = transport::connect(&config);

    let reconciler = Reconciler::new(&cache, remote.as_ref(), &credential, &recipient, &owner);

    for kind in kinds {
        let report = reconciler.pull_kind(kind)?;
        output::print_pull_report(&report);
    }

    Ok(())
}
