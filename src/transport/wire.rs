//! Conversion between cached records and sealed remote secrets.
//!
//! This is the only place a payload crosses the trust boundary: the
//! payload's JSON is envelope-encrypted on the way out and opened with
//! the owner's key on the way back in.

use zeroize::Zeroize;

use super::RemoteSecret;
use crate::crypto::{self, OwnerKey, RecipientKey};
use crate::errors::{KeeperError, Result};
use crate::secrets::{SecretPayload, SecretRecord};

/// Seal a cached record for `recipient`.
pub fn seal<P: SecretPayload>(
    record: &SecretRecord<P>,
    recipient: &RecipientKey,
) -> Result<RemoteSecret> {
    let mut plaintext = serde_json::to_vec(&record.payload)
        .map_err(|e| KeeperError::SerializationError(format!("payload: {e}")))?;
    let envelope = crypto::encrypt(&plaintext, recipient);
    plaintext.zeroize();

    Ok(RemoteSecret {
        secret_name: record.secret_name.clone(),
        secret_type: P::KIND,
        secret_owner: record.owner.clone(),
        envelope: envelope?,
        meta: record.meta.clone(),
        updated_at: record.updated_at,
    })
}

/// Open a remote secret into a record of payload type `P`.
///
/// Fails if the remote secret is of a different type than `P`.
pub fn open<P: SecretPayload>(remote: &RemoteSecret, owner: &OwnerKey) -> Result<SecretRecord<P>> {
    if remote.secret_type != P::KIND {
        return Err(KeeperError::Protocol(format!(
            "expected a {} secret, server returned {} for '{}'",
            P::KIND,
            remote.secret_type,
            remote.secret_name
        )));
    }

    let mut plaintext = crypto::decrypt(&remote.envelope, owner)?;
    let payload = serde_json::from_slice::<P>(&plaintext);
    plaintext.zeroize();
    // serde_json messages can quote field values, so only report the position.
    let payload = payload.map_err(|e| {
        KeeperError::SerializationError(format!(
            "payload of '{}' is malformed (line {}, column {})",
            remote.secret_name,
            e.line(),
            e.column()
        ))
    })?;

    Ok(SecretRecord {
        secret_name: remote.secret_name.clone(),
        owner: remote.secret_owner.clone(),
        payload,
        meta: remote.meta.clone(),
        updated_at: remote.updated_at,
    })
}
