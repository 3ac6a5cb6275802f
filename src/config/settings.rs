use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{KeeperError, Result};
use crate::resolver::ResolutionStrategy;
use crate::transport::TransportKind;

/// Project-level configuration, loaded from `.keeper.toml`.
///
/// Every field has a default so keeper works without any config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the secret server.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Wire protocol: `http` or `rpc`.
    #[serde(default)]
    pub transport: TransportKind,

    /// Owner the cache and remote secrets are scoped to.
    #[serde(default)]
    pub owner: Option<String>,

    /// SQLite cache location, relative to the project root.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// PEM public key secrets are sealed for.
    #[serde(default = "default_public_key")]
    pub public_key: String,

    /// PEM private key used to open server copies.
    #[serde(default = "default_private_key")]
    pub private_key: String,

    /// Per-call network timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient transport failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles on each retry.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Conflict strategy used when `sync` gets no `--strategy`.
    #[serde(default)]
    pub strategy: ResolutionStrategy,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_server_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_cache_path() -> String {
    ".keeper/cache.db".to_string()
}

fn default_public_key() -> String {
    ".keeper/keeper_public.pem".to_string()
}

fn default_private_key() -> String {
    ".keeper/keeper_private.pem".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            transport: TransportKind::default(),
            owner: None,
            cache_path: default_cache_path(),
            public_key: default_public_key(),
            private_key: default_private_key(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            strategy: ResolutionStrategy::default(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".keeper.toml";

    /// Load settings from `<project_dir>/.keeper.toml`.
    ///
    /// A missing file yields defaults; an unparsable one is an error.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit file, which must exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            KeeperError::ConfigError(format!("Failed to read {}: {e}", config_path.display()))
        })?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KeeperError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Full path to the cache database.
    ///
    /// Example: `project_dir/.keeper/cache.db`.  Absolute settings win.
    pub fn cache_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.cache_path)
    }

    pub fn public_key_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.public_key)
    }

    pub fn private_key_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.private_key)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
