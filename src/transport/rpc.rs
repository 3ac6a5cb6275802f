//! RPC adapter: JSON-RPC 2.0 over `POST {base}/rpc`.
//!
//! Methods are `Secrets.Get`, `Secrets.List`, `Secrets.Save` and
//! `Secrets.Delete`.  The bearer token rides in the `authorization`
//! header, the same channel gRPC-style metadata would use; it is never
//! part of `params`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use ureq::Agent;

use super::{request_error, status_error, Credential, RemoteSecret, RemoteTransport};
use crate::errors::{KeeperError, Result};
use crate::secrets::SecretType;

/// Server-defined error codes (JSON-RPC reserves -32000..-32099 for these).
pub const CODE_UNAUTHORIZED: i64 = -32001;
pub const CODE_UNAVAILABLE: i64 = -32003;
pub const CODE_NOT_FOUND: i64 = -32004;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

/// A successful reply, or the server saying the secret does not exist.
///
/// Only `get` and `delete` give "not found" a meaning of their own.
enum Reply<T> {
    Value(Option<T>),
    NotFound(String),
}

impl<T> Reply<T> {
    /// Treat "not found" as a failure.
    fn required(self) -> Result<Option<T>> {
        match self {
            Reply::Value(value) => Ok(value),
            Reply::NotFound(message) => Err(server_error(CODE_NOT_FOUND, message)),
        }
    }
}

fn server_error(code: i64, message: String) -> KeeperError {
    KeeperError::ServerError {
        status: i32::try_from(code).unwrap_or(i32::MIN),
        message,
    }
}

/// Blocking JSON-RPC client for the secret store.
pub struct RpcTransport {
    agent: Agent,
    endpoint: String,
    next_id: AtomicU64,
}

impl RpcTransport {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            endpoint: format!("{}/rpc", base_url.trim_end_matches('/')),
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue one call.  A `null` result is `Reply::Value(None)`.
    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        credential: &Credential,
    ) -> Result<Reply<T>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, id = request.id, "rpc call");

        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("authorization", credential.authorization())
            .send_json(&request)
            .map_err(request_error)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.body_mut().read_to_string().unwrap_or_default();
            return Err(status_error(status, message.trim().to_string()));
        }

        let reply: RpcResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| KeeperError::Protocol(format!("invalid JSON-RPC reply: {e}")))?;

        if let Some(err) = reply.error {
            return match err.code {
                CODE_NOT_FOUND => Ok(Reply::NotFound(err.message)),
                CODE_UNAUTHORIZED => Err(KeeperError::Unauthorized),
                CODE_UNAVAILABLE => Err(KeeperError::Unavailable(err.message)),
                code => Err(server_error(code, err.message)),
            };
        }

        match reply.result {
            None | Some(Value::Null) => Ok(Reply::Value(None)),
            Some(value) => serde_json::from_value(value)
                .map(|v| Reply::Value(Some(v)))
                .map_err(|e| KeeperError::Protocol(format!("{method} result: {e}"))),
        }
    }
}

impl RemoteTransport for RpcTransport {
    fn get(
        &self,
        kind: SecretType,
        secret_name: &str,
        credential: &Credential,
    ) -> Result<Option<RemoteSecret>> {
        let reply = self.call(
            "Secrets.Get",
            json!({ "secret_type": kind, "secret_name": secret_name }),
            credential,
        )?;
        match reply {
            Reply::Value(secret) => Ok(secret),
            Reply::NotFound(_) => Ok(None),
        }
    }

    fn save(&self, kind: SecretType, secret: &RemoteSecret, credential: &Credential) -> Result<()> {
        self.call::<Value>(
            "Secrets.Save",
            json!({ "secret_type": kind, "secret": secret }),
            credential,
        )?
        .required()?;
        Ok(())
    }

    fn list(&self, kind: SecretType, credential: &Credential) -> Result<Vec<RemoteSecret>> {
        Ok(self
            .call("Secrets.List", json!({ "secret_type": kind }), credential)?
            .required()?
            .unwrap_or_default())
    }

    fn delete(&self, kind: SecretType, secret_name: &str, credential: &Credential) -> Result<()> {
        // Deleting something already gone is fine.
        self.call::<Value>(
            "Secrets.Delete",
            json!({ "secret_type": kind, "secret_name": secret_name }),
            credential,
        )?;
        Ok(())
    }
}
