//! Bounded exponential backoff around a whole transport call.
//!
//! Only transient failures are retried (`Unavailable`, 502/503/504).
//! Everything else, including `Unauthorized`, is returned immediately.

use std::thread;
use std::time::Duration;

use tracing::warn;

use super::{Credential, RemoteSecret, RemoteTransport};
use crate::errors::Result;
use crate::secrets::SecretType;

/// Upper bound on a single backoff sleep.
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Wraps a transport with a retry policy.
pub struct Retrying<T> {
    inner: T,
    max_retries: u32,
    base_delay: Duration,
}

impl<T: RemoteTransport> Retrying<T> {
    pub fn new(inner: T, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }

    /// Access the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    fn with_retry<R>(&self, op: &str, mut call: impl FnMut() -> Result<R>) -> Result<R> {
        let mut attempt = 0;
        loop {
            match call() {
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        op,
                        attempt,
                        max = self.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient transport failure, retrying"
                    );
                    thread::sleep(delay);
                }
                other => return other,
            }
        }
    }
}

impl<T: RemoteTransport> RemoteTransport for Retrying<T> {
    fn get(
        &self,
        kind: SecretType,
        secret_name: &str,
        credential: &Credential,
    ) -> Result<Option<RemoteSecret>> {
        self.with_retry("get", || self.inner.get(kind, secret_name, credential))
    }

    fn save(&self, kind: SecretType, secret: &RemoteSecret, credential: &Credential) -> Result<()> {
        self.with_retry("save", || self.inner.save(kind, secret, credential))
    }

    fn list(&self, kind: SecretType, credential: &Credential) -> Result<Vec<RemoteSecret>> {
        self.with_retry("list", || self.inner.list(kind, credential))
    }

    fn delete(&self, kind: SecretType, secret_name: &str, credential: &Credential) -> Result<()> {
        self.with_retry("delete", || self.inner.delete(kind, secret_name, credential))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::errors::KeeperError;

    /// Fails `failures` times with the given error, then succeeds.
    struct Flaky {
        failures: Cell<u32>,
        calls: Cell<u32>,
        error: fn() -> KeeperError,
    }

    impl Flaky {
        fn new(failures: u32, error: fn() -> KeeperError) -> Self {
            Self {
                failures: Cell::new(failures),
                calls: Cell::new(0),
                error,
            }
        }

        fn attempt(&self) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                Err((self.error)())
            } else {
                Ok(())
            }
        }
    }

    impl RemoteTransport for Flaky {
        fn get(&self, _: SecretType, _: &str, _: &Credential) -> Result<Option<RemoteSecret>> {
            self.attempt().map(|()| None)
        }
        fn save(&self, _: SecretType, _: &RemoteSecret, _: &Credential) -> Result<()> {
            self.attempt()
        }
        fn list(&self, _: SecretType, _: &Credential) -> Result<Vec<RemoteSecret>> {
            self.attempt().map(|()| Vec::new())
        }
        fn delete(&self, _: SecretType, _: &str, _: &Credential) -> Result<()> {
            self.attempt()
        }
    }

    fn unavailable() -> KeeperError {
        KeeperError::Unavailable("connection refused".into())
    }

    #[test]
    fn retries_transient_errors_until_success() {
        let retrying = Retrying::new(Flaky::new(2, unavailable), 3, Duration::ZERO);
        let cred = Credential::new("t");
        assert!(retrying.get(SecretType::Text, "a", &cred).unwrap().is_none());
        assert_eq!(retrying.inner().calls.get(), 3);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let retrying = Retrying::new(Flaky::new(10, unavailable), 2, Duration::ZERO);
        let cred = Credential::new("t");
        let result = retrying.list(SecretType::Text, &cred);
        assert!(matches!(result, Err(KeeperError::Unavailable(_))));
        assert_eq!(retrying.inner().calls.get(), 3);
    }

    #[test]
    fn does_not_retry_unauthorized() {
        let retrying = Retrying::new(
            Flaky::new(5, || KeeperError::Unauthorized),
            3,
            Duration::ZERO,
        );
        let cred = Credential::new("t");
        let result = retrying.delete(SecretType::Binary, "x", &cred);
        assert!(matches!(result, Err(KeeperError::Unauthorized)));
        assert_eq!(retrying.inner().calls.get(), 1);
    }

    #[test]
    fn retries_gateway_errors_but_not_500() {
        let retrying = Retrying::new(
            Flaky::new(1, || KeeperError::ServerError {
                status: 502,
                message: String::new(),
            }),
            3,
            Duration::ZERO,
        );
        let cred = Credential::new("t");
        assert!(retrying.delete(SecretType::Text, "x", &cred).is_ok());

        let retrying = Retrying::new(
            Flaky::new(1, || KeeperError::ServerError {
                status: 500,
                message: String::new(),
            }),
            3,
            Duration::ZERO,
        );
        assert!(retrying.delete(SecretType::Text, "x", &cred).is_err());
        assert_eq!(retrying.inner().calls.get(), 1);
    }

    #[test]
    fn backoff_doubles_and_is_capped() {
        let retrying = Retrying::new(Flaky::new(0, unavailable), 3, Duration::from_millis(100));
        assert_eq!(retrying.delay_for(0), Duration::from_millis(100));
        assert_eq!(retrying.delay_for(1), Duration::from_millis(200));
        assert_eq!(retrying.delay_for(3), Duration::from_millis(800));
        assert_eq!(retrying.delay_for(40), MAX_DELAY);
    }
}
