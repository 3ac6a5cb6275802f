//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod gitignore;
pub mod output;
pub mod prompt;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::cache::SecretCache;
use crate::config::{ClientConfig, ClientConfigBuilder, Settings};
use crate::crypto::{OwnerKey, RecipientKey};
use crate::errors::{KeeperError, Result};
use crate::secrets::{validate_secret_name, SecretPayload, SecretRecord, SecretType};
use crate::transport::Credential;

/// keeper: personal secrets with an encrypted remote copy.
#[derive(Parser)]
#[command(
    name = "keeper",
    about = "Personal secrets manager with encrypted remote sync",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./.keeper.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL
    #[arg(long, env = "KEEPER_SERVER", global = true)]
    pub server: Option<String>,

    /// Owner the secrets belong to
    #[arg(long, env = "KEEPER_OWNER", global = true)]
    pub owner: Option<String>,

    /// Bearer token for the server
    #[arg(long, env = "KEEPER_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Local cache database
    #[arg(long, env = "KEEPER_CACHE", global = true)]
    pub cache: Option<PathBuf>,

    /// Wire protocol: http or rpc
    #[arg(long, global = true)]
    pub transport: Option<String>,

    /// More diagnostics on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a bank card in the local cache
    AddCard {
        /// Secret name (e.g. visa-main)
        name: String,
        /// Card number
        #[arg(long)]
        number: String,
        /// Name on the card
        #[arg(long)]
        holder: String,
        /// Expiry as printed, e.g. 12/27
        #[arg(long)]
        expiry: String,
        /// CVV (omit for a hidden prompt)
        #[arg(long)]
        cvv: Option<String>,
        /// Free-form label
        #[arg(long)]
        meta: Option<String>,
    },

    /// Store a text note in the local cache
    AddText {
        /// Secret name
        name: String,
        /// Text content (omit to read stdin or prompt)
        #[arg(long)]
        content: Option<String>,
        /// Free-form label
        #[arg(long)]
        meta: Option<String>,
    },

    /// Store a file's bytes in the local cache
    AddBinary {
        /// Secret name
        name: String,
        /// File to read
        #[arg(long)]
        file: PathBuf,
        /// Free-form label
        #[arg(long)]
        meta: Option<String>,
    },

    /// Store a username and password in the local cache
    AddCredentials {
        /// Secret name
        name: String,
        /// Login name
        #[arg(long)]
        username: String,
        /// Password (omit for a hidden prompt)
        #[arg(long)]
        password: Option<String>,
        /// Free-form label
        #[arg(long)]
        meta: Option<String>,
    },

    /// List cached secrets
    List {
        /// Only this type (bank_card, text, binary, credentials)
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Show one secret
    Get {
        /// Secret type
        kind: String,
        /// Secret name
        name: String,
        /// Fetch and decrypt the server copy instead of the cache
        #[arg(long)]
        remote: bool,
        /// Write binary secrets to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a secret from the cache
    Delete {
        /// Secret type
        kind: String,
        /// Secret name
        name: String,
        /// Also delete the server copy
        #[arg(long)]
        remote: bool,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Push cached secrets to the server
    Sync {
        /// Conflict strategy: server, client or interactive
        #[arg(long)]
        strategy: Option<String>,
        /// Only this type
        #[arg(long = "type")]
        kind: Option<String>,
        /// Give up after this many seconds
        #[arg(long)]
        deadline: Option<u64>,
    },

    /// Fetch newer server copies into the cache
    Pull {
        /// Only this type
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Generate an RSA key pair for sealing secrets
    Keygen {
        /// Output directory (default: directory of the configured private key)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Modulus size in bits
        #[arg(long, default_value_t = 3072)]
        bits: usize,
    },

    /// Manage the stored bearer token
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

/// Auth subcommands for the OS keyring.
#[derive(clap::Subcommand)]
pub enum AuthAction {
    /// Save the bearer token to the OS keyring
    SaveToken,

    /// Remove the bearer token from the OS keyring
    ForgetToken,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Directory relative paths in `.keeper.toml` are resolved against.
pub fn project_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}

/// Load `--config`, or `./.keeper.toml`, or defaults.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(&project_dir()?),
    }
}

/// Build the per-invocation config.
///
/// Precedence: flag > environment > `.keeper.toml` > default.  Clap
/// already folds the environment into the flag values.
pub fn client_config(cli: &Cli, settings: &Settings) -> Result<ClientConfig> {
    let mut builder = ClientConfigBuilder::from_settings(settings);
    if let Some(url) = &cli.server {
        builder = builder.server_url(url.as_str());
    }
    if let Some(owner) = &cli.owner {
        builder = builder.owner(owner.as_str());
    }
    if let Some(transport) = &cli.transport {
        builder = builder.transport(transport.parse()?);
    }
    builder.build()
}

/// Open the local cache for the configured owner.
pub fn open_cache(cli: &Cli, settings: &Settings, config: &ClientConfig) -> Result<SecretCache> {
    let path = match &cli.cache {
        Some(path) => path.clone(),
        None => settings.cache_path(&project_dir()?),
    };
    SecretCache::open(&path, &config.owner)
}

/// Get the bearer token, trying in order:
/// 1. `--token` / `KEEPER_TOKEN`
/// 2. OS keyring (if compiled with `keyring-store` feature)
pub fn resolve_credential(cli: &Cli, config: &ClientConfig) -> Result<Credential> {
    if let Some(token) = cli.token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(Credential::new(token));
    }

    #[cfg(feature = "keyring-store")]
    match crate::keyring::get_token(&config.server_url, &config.owner) {
        Ok(Some(token)) => return Ok(Credential::new(token)),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "keyring unavailable"),
    }

    #[cfg(not(feature = "keyring-store"))]
    let _ = config;

    Err(KeeperError::MissingCredential)
}

/// The public key secrets are sealed for.
pub fn recipient_key(settings: &Settings) -> Result<RecipientKey> {
    let path = settings.public_key_path(&project_dir()?);
    RecipientKey::from_file(&path).map_err(|e| with_keygen_hint(e, &path))
}

/// The private key that opens server copies.
pub fn owner_key(settings: &Settings) -> Result<OwnerKey> {
    let path = settings.private_key_path(&project_dir()?);
    OwnerKey::from_file(&path).map_err(|e| with_keygen_hint(e, &path))
}

fn with_keygen_hint(err: KeeperError, path: &std::path::Path) -> KeeperError {
    if path.exists() {
        err
    } else {
        KeeperError::ConfigError(format!(
            "key file {} not found — run `keeper keygen` first",
            path.display()
        ))
    }
}

/// Read a secret value without echoing it.
///
/// Piped stdin is read as one line so scripts can supply the value.
pub fn prompt_hidden(label: &str) -> Result<Zeroizing<String>> {
    if !std::io::stdin().is_terminal() {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        return Ok(Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string()));
    }

    let value = dialoguer::Password::new()
        .with_prompt(label)
        .interact()
        .map_err(|e| KeeperError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Validate, stamp and upsert a new local secret, then report it.
pub fn store_secret<P: SecretPayload>(
    cli: &Cli,
    name: &str,
    payload: P,
    meta: Option<&str>,
) -> Result<()> {
    validate_secret_name(name)?;

    let settings = load_settings(cli)?;
    let config = client_config(cli, &settings)?;
    let cache = open_cache(cli, &settings, &config)?;

    let existed = cache.get::<P>(name)?.is_some();
    let record = SecretRecord::new(name, &config.owner, payload, meta.map(str::to_string));
    cache.upsert(&record)?;

    output::success(&format!(
        "{} '{name}' {} ({} cached)",
        P::KIND,
        if existed { "updated" } else { "added" },
        cache.count(P::KIND)?
    ));
    output::tip("Push it to the server: keeper sync");

    Ok(())
}

/// Parse an optional `--type` filter into the types to act on.
pub fn selected_types(kind: Option<&str>) -> Result<Vec<SecretType>> {
    match kind {
        Some(kind) => Ok(vec![kind.parse()?]),
        None => Ok(SecretType::ALL.to_vec()),
    }
}
