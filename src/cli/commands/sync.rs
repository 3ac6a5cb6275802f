//! `keeper sync` — push cached secrets to the server.

use std::io::{self, IsTerminal};
use std::time::Duration;

use crate::cli::output;
use crate::cli::prompt::TerminalChoiceProvider;
use crate::cli::{
    client_config, load_settings, open_cache, owner_key, recipient_key, resolve_credential,
    selected_types, Cli,
};
use crate::errors::Result;
use crate::resolver::{ChoiceProvider, LineChoiceProvider, NoPrompt, ResolutionStrategy};
use crate::sync::{CancelToken, Reconciler};
use crate::transport;

/// Execute the `sync` command.
pub fn execute(
    cli: &Cli,
    strategy: Option<&str>,
    kind: Option<&str>,
    deadline: Option<u64>,
) -> Result<()> {
    let settings = load_settings(cli)?;
    let strategy: ResolutionStrategy = match strategy {
        Some(s) => s.parse()?,
        None => settings.strategy,
    };
    let kinds = selected_types(kind)?;

    let config = client_config(cli, &settings)?;
    let credential = resolve_credential(cli, &config)?;
    let recipient = recipient_key(&settings)?;
    let owner = owner_key(&settings)?;
    let cache = open_cache(cli, &settings, &config)?;
    let remote = transport::connect(&config);

    let cancel = deadline.map_or_else(CancelToken::new, |secs| {
        CancelToken::with_timeout(Duration::from_secs(secs))
    });

    let reconciler = Reconciler::new(&cache, remote.as_ref(), &credential, &recipient, &owner)
        .with_strategy(strategy)
        .with_cancel(cancel);

    let mut provider: Box<dyn ChoiceProvider> = match strategy {
        ResolutionStrategy::Interactive if io::stdin().is_terminal() => {
            Box::new(TerminalChoiceProvider)
        }
        ResolutionStrategy::Interactive => Box::new(LineChoiceProvider::new(io::stdin().lock())),
        _ => Box::new(NoPrompt),
    };

    output::info(&format!(
        "Syncing to {} as '{}' (strategy: {strategy})",
        config.server_url, config.owner
    ));

    for kind in kinds {
        let report = reconciler.run_kind(kind, provider.as_mut())?;
        output::print_sync_report(&report);
    }

    Ok(())
}
