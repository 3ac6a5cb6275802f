//! `keeper get` — print one secret, from the cache or the server.

use std::io::Write;
use std::path::Path;

use crate::cli::output;
use crate::cli::{
    client_config, load_settings, open_cache, owner_key, resolve_credential, Cli,
};
use crate::errors::{KeeperError, Result};
use crate::secrets::{
    validate_secret_name, BankCard, Binary, Credentials, SecretPayload, SecretRecord, SecretType,
    Text,
};
use crate::transport::{self, wire, RemoteTransport};

/// Execute the `get` command.
pub fn execute(
    cli: &Cli,
    kind: &str,
    name: &str,
    remote: bool,
    out: Option<&Path>,
) -> Result<()> {
    let kind: SecretType = kind.parse()?;
    validate_secret_name(name)?;

    match kind {
        SecretType::BankCard => {
            let card = fetch::<BankCard>(cli, name, remote)?;
            let p = &card.payload;
            output::print_fields(&[
                ("number", p.number.clone()),
                ("holder", p.card_holder.clone()),
                ("expiry", p.expiry.clone()),
                ("cvv", p.cvv.clone()),
                ("meta", card.meta.clone().unwrap_or_default()),
            ]);
        }
        SecretType::Text => {
            let text = fetch::<Text>(cli, name, remote)?;
            println!("{}", text.payload.content);
        }
        SecretType::Binary => {
            let binary = fetch::<Binary>(cli, name, remote)?;
            match out {
                Some(path) => {
                    std::fs::write(path, &binary.payload.data)?;
                    output::success(&format!(
                        "Wrote {} bytes to {}",
                        binary.payload.data.len(),
                        path.display()
                    ));
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&binary.payload.data)?;
                    stdout.flush()?;
                }
            }
        }
        SecretType::Credentials => {
            let login = fetch::<Credentials>(cli, name, remote)?;
            output::print_fields(&[
                ("username", login.payload.username.clone()),
                ("password", login.payload.password.clone()),
                ("meta", login.meta.clone().unwrap_or_default()),
            ]);
        }
    }

    Ok(())
}

/// Load a record from the cache, or fetch and open the server copy.
fn fetch<P: SecretPayload>(cli: &Cli, name: &str, remote: bool) -> Result<SecretRecord<P>> {
    let settings = load_settings(cli)?;
    let config = client_config(cli, &settings)?;

    let found = if remote {
        let credential = resolve_credential(cli, &config)?;
        let key = owner_key(&settings)?;
        transport::connect(&config)
            .get(P::KIND, name, &credential)?
            .map(|secret| wire::open::<P>(&secret, &key))
            .transpose()?
    } else {
        open_cache(cli, &settings, &config)?.get::<P>(name)?
    };

    found.ok_or_else(|| {
        let place = if remote { "on the server" } else { "in the local cache" };
        KeeperError::CommandFailed(format!("no {} named '{name}' {place}", P::KIND))
    })
}
