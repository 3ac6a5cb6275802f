//! Request/response adapter: JSON over plain HTTP routes.
//!
//! ```text
//! GET    /api/v1/secrets/{type}          list
//! GET    /api/v1/secrets/{type}/{name}   get   (404 -> None)
//! PUT    /api/v1/secrets/{type}/{name}   save  (JSON body)
//! DELETE /api/v1/secrets/{type}/{name}   delete (404 is success)
//! ```

use std::time::Duration;

use tracing::debug;
use ureq::http::Response;
use ureq::{Agent, Body};

use super::{request_error, status_error, Credential, RemoteSecret, RemoteTransport};
use crate::errors::{KeeperError, Result};
use crate::secrets::SecretType;

/// Route prefix for secret resources.
const API_PREFIX: &str = "/api/v1/secrets";

/// Blocking HTTP client for the secret store.
pub struct HttpTransport {
    agent: Agent,
    base_url: String,
}

impl HttpTransport {
    /// Create a client for `base_url` with a per-call timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self, kind: SecretType) -> String {
        format!("{}{API_PREFIX}/{}", self.base_url, kind.as_str())
    }

    fn item_url(&self, kind: SecretType, secret_name: &str) -> String {
        format!("{}/{secret_name}", self.collection_url(kind))
    }
}

/// Turn a non-success response into a transport error.
fn failure(mut response: Response<Body>) -> KeeperError {
    let status = response.status().as_u16();
    let message = response
        .body_mut()
        .read_to_string()
        .unwrap_or_default()
        .trim()
        .to_string();
    status_error(status, message)
}

fn read_json<T: serde::de::DeserializeOwned>(mut response: Response<Body>) -> Result<T> {
    response
        .body_mut()
        .read_json::<T>()
        .map_err(|e| KeeperError::Protocol(format!("invalid JSON body: {e}")))
}

impl RemoteTransport for HttpTransport {
    fn get(
        &self,
        kind: SecretType,
        secret_name: &str,
        credential: &Credential,
    ) -> Result<Option<RemoteSecret>> {
        let url = self.item_url(kind, secret_name);
        debug!(%kind, name = secret_name, "GET secret");

        let response = self
            .agent
            .get(&url)
            .header("Authorization", credential.authorization())
            .call()
            .map_err(request_error)?;

        match response.status().as_u16() {
            200 => read_json(response).map(Some),
            404 => Ok(None),
            _ => Err(failure(response)),
        }
    }

    fn save(&self, kind: SecretType, secret: &RemoteSecret, credential: &Credential) -> Result<()> {
        let url = self.item_url(kind, &secret.secret_name);
        debug!(%kind, name = %secret.secret_name, "PUT secret");

        let response = self
            .agent
            .put(&url)
            .header("Authorization", credential.authorization())
            .send_json(secret)
            .map_err(request_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(failure(response))
        }
    }

    fn list(&self, kind: SecretType, credential: &Credential) -> Result<Vec<RemoteSecret>> {
        let url = self.collection_url(kind);
        debug!(%kind, "GET secret list");

        let response = self
            .agent
            .get(&url)
            .header("Authorization", credential.authorization())
            .call()
            .map_err(request_error)?;

        match response.status().as_u16() {
            200 => read_json(response),
            204 => Ok(Vec::new()),
            _ => Err(failure(response)),
        }
    }

    fn delete(&self, kind: SecretType, secret_name: &str, credential: &Credential) -> Result<()> {
        let url = self.item_url(kind, secret_name);
        debug!(%kind, name = secret_name, "DELETE secret");

        let response = self
            .agent
            .delete(&url)
            .header("Authorization", credential.authorization())
            .call()
            .map_err(request_error)?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 404 {
            Ok(())
        } else {
            Err(failure(response))
        }
    }
}
