//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use keeper::crypto::{OwnerKey, RecipientKey};
use keeper::errors::{KeeperError, Result};
use keeper::secrets::{SecretPayload, SecretRecord, SecretType};
use keeper::transport::{wire, Credential, RemoteSecret, RemoteTransport};

pub const OWNER: &str = "alice";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn owner_key() -> OwnerKey {
    OwnerKey::from_file(&fixture("owner_private.pem")).unwrap()
}

pub fn recipient_key() -> RecipientKey {
    RecipientKey::from_file(&fixture("owner_public.pem")).unwrap()
}

pub fn other_owner_key() -> OwnerKey {
    OwnerKey::from_file(&fixture("other_private.pem")).unwrap()
}

pub fn credential() -> Credential {
    Credential::new("test-token")
}

/// A fixed instant plus `secs` seconds, so tests control ordering.
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
        + Duration::seconds(secs)
}

pub fn record<P: SecretPayload>(name: &str, payload: P, secs: i64) -> SecretRecord<P> {
    SecretRecord {
        secret_name: name.to_string(),
        owner: OWNER.to_string(),
        payload,
        meta: None,
        updated_at: at(secs),
    }
}

/// In-memory remote store that records every call.
#[derive(Default)]
pub struct FakeRemote {
    secrets: Mutex<HashMap<(SecretType, String), RemoteSecret>>,
    saves: Mutex<Vec<RemoteSecret>>,
    gets: Mutex<Vec<String>>,
    /// When set, every call fails with `Unauthorized`.
    pub reject: bool,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Seed the store with a sealed copy of `record`.
    pub fn insert<P: SecretPayload>(&self, record: &SecretRecord<P>, key: &RecipientKey) {
        let sealed = wire::seal(record, key).unwrap();
        self.secrets
            .lock()
            .unwrap()
            .insert((P::KIND, sealed.secret_name.clone()), sealed);
    }

    pub fn saves(&self) -> Vec<RemoteSecret> {
        self.saves.lock().unwrap().clone()
    }

    pub fn saved_names(&self) -> Vec<String> {
        self.saves()
            .into_iter()
            .map(|secret| secret.secret_name)
            .collect()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn stored(&self, kind: SecretType, name: &str) -> Option<RemoteSecret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(kind, name.to_string()))
            .cloned()
    }

    fn check(&self, credential: &Credential) -> Result<()> {
        if self.reject || credential.expose().is_empty() {
            Err(KeeperError::Unauthorized)
        } else {
            Ok(())
        }
    }
}

impl RemoteTransport for FakeRemote {
    fn get(
        &self,
        kind: SecretType,
        secret_name: &str,
        credential: &Credential,
    ) -> Result<Option<RemoteSecret>> {
        self.check(credential)?;
        self.gets.lock().unwrap().push(secret_name.to_string());
        Ok(self.stored(kind, secret_name))
    }

    fn save(&self, kind: SecretType, secret: &RemoteSecret, credential: &Credential) -> Result<()> {
        self.check(credential)?;
        self.saves.lock().unwrap().push(secret.clone());
        self.secrets
            .lock()
            .unwrap()
            .insert((kind, secret.secret_name.clone()), secret.clone());
        Ok(())
    }

    fn list(&self, kind: SecretType, credential: &Credential) -> Result<Vec<RemoteSecret>> {
        self.check(credential)?;
        let mut all: Vec<RemoteSecret> = self
            .secrets
            .lock()
            .unwrap()
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, secret)| secret.clone())
            .collect();
        all.sort_by(|a, b| a.secret_name.cmp(&b.secret_name));
        Ok(all)
    }

    fn delete(&self, kind: SecretType, secret_name: &str, credential: &Credential) -> Result<()> {
        self.check(credential)?;
        self.secrets
            .lock()
            .unwrap()
            .remove(&(kind, secret_name.to_string()));
        Ok(())
    }
}
