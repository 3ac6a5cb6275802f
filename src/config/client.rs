//! Per-invocation client configuration.
//!
//! Built once from parsed flags, environment and `.keeper.toml`, then
//! passed by reference to whatever needs it.  Nothing here is global.

use std::time::Duration;

use super::Settings;
use crate::errors::{KeeperError, Result};
use crate::transport::TransportKind;

/// Validated settings for talking to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub transport: TransportKind,
    pub owner: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for `ClientConfig`; unset fields fall back to `Settings` defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    server_url: Option<String>,
    transport: Option<TransportKind>,
    owner: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_base_delay: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Seed every field from a settings file.  Later calls override.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            server_url: Some(settings.server_url.clone()),
            transport: Some(settings.transport),
            owner: settings.owner.clone(),
            timeout: Some(Duration::from_secs(settings.timeout_secs)),
            max_retries: Some(settings.max_retries),
            retry_base_delay: Some(Duration::from_millis(settings.retry_base_delay_ms)),
        }
    }

    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn transport(mut self, transport: TransportKind) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = Some(delay);
        self
    }

    /// Validate and produce the config.
    ///
    /// Requires a non-empty owner and an `http://` or `https://` URL.
    pub fn build(self) -> Result<ClientConfig> {
        let defaults = Settings::default();

        let owner = self.owner.map(|o| o.trim().to_string()).unwrap_or_default();
        if owner.is_empty() {
            return Err(KeeperError::ConfigError(
                "owner is not set — pass --owner, set KEEPER_OWNER or add `owner` to .keeper.toml"
                    .into(),
            ));
        }

        let server_url = self
            .server_url
            .unwrap_or(defaults.server_url)
            .trim()
            .trim_end_matches('/')
            .to_string();
        let has_host = ["http://", "https://"]
            .iter()
            .any(|scheme| server_url.len() > scheme.len() && server_url.starts_with(scheme));
        if !has_host {
            return Err(KeeperError::ConfigError(format!(
                "server URL '{server_url}' must start with http:// or https://"
            )));
        }

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(defaults.timeout_secs));
        if timeout.is_zero() {
            return Err(KeeperError::ConfigError("timeout must be positive".into()));
        }

        Ok(ClientConfig {
            server_url,
            transport: self.transport.unwrap_or(defaults.transport),
            owner,
            timeout,
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_base_delay: self
                .retry_base_delay
                .unwrap_or(Duration::from_millis(defaults.retry_base_delay_ms)),
        })
    }
}
