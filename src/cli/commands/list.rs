//! `keeper list` — show cached secrets without their values.

use crate::cache::SecretCache;
use crate::cli::output::{self, SecretRow};
use crate::cli::{client_config, load_settings, open_cache, selected_types, Cli};
use crate::errors::Result;
use crate::secrets::{BankCard, Binary, Credentials, SecretPayload, SecretType, Text};

/// Execute the `list` command.
pub fn execute(cli: &Cli, kind: Option<&str>) -> Result<()> {
    let kinds = selected_types(kind)?;
    let settings = load_settings(cli)?;
    let config = client_config(cli, &settings)?;
    let cache = open_cache(cli, &settings, &config)?;

    let mut rows = Vec::new();
    for kind in kinds {
        rows.extend(rows_for(&cache, kind)?);
    }

    output::print_secrets_table(&rows);
    Ok(())
}

fn rows_for(cache: &SecretCache, kind: SecretType) -> Result<Vec<SecretRow>> {
    match kind {
        SecretType::BankCard => rows_of::<BankCard>(cache),
        SecretType::Text => rows_of::<Text>(cache),
        SecretType::Binary => rows_of::<Binary>(cache),
        SecretType::Credentials => rows_of::<Credentials>(cache),
    }
}

fn rows_of<P: SecretPayload>(cache: &SecretCache) -> Result<Vec<SecretRow>> {
    Ok(cache
        .list::<P>()?
        .into_iter()
        .map(|record| SecretRow {
            kind: P::KIND,
            name: record.secret_name,
            meta: record.meta,
            updated_at: record.updated_at,
        })
        .collect())
}
