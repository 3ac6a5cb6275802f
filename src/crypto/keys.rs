//! RSA key material for envelope encryption.
//!
//! - `RecipientKey` wraps the public half; secrets are sealed for it.
//! - `OwnerKey` wraps the private half; only it can open an envelope.
//!
//! Both load from PEM text.  Public keys may be SPKI (`PUBLIC KEY`) or
//! PKCS#1 (`RSA PUBLIC KEY`); private keys may be PKCS#8 (`PRIVATE KEY`)
//! or PKCS#1 (`RSA PRIVATE KEY`).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::errors::{KeeperError, Result};

/// Smallest modulus `generate_key_pair` will produce.
pub const MIN_KEY_BITS: usize = 2048;

/// File name of the generated private key.
pub const PRIVATE_KEY_FILE: &str = "keeper_private.pem";

/// File name of the generated public key.
pub const PUBLIC_KEY_FILE: &str = "keeper_public.pem";

/// Public key that secrets are sealed for.
#[derive(Clone, PartialEq, Eq)]
pub struct RecipientKey {
    inner: RsaPublicKey,
}

impl RecipientKey {
    /// Parse a PEM-encoded public key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        let inner = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| KeeperError::KeyFormat(format!("not an RSA public key: {e}")))?;
        Ok(Self { inner })
    }

    /// Read and parse a PEM-encoded public key from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_pem(&read_key_file(path)?)
    }

    /// Encode as SPKI PEM.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeeperError::KeyFormat(format!("cannot encode public key: {e}")))
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.inner.size() * 8
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

impl fmt::Debug for RecipientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientKey")
            .field("bits", &self.bits())
            .finish()
    }
}

/// Private key that opens envelopes sealed for the matching `RecipientKey`.
///
/// The underlying `RsaPrivateKey` zeroizes its components on drop.
#[derive(Clone)]
pub struct OwnerKey {
    inner: RsaPrivateKey,
}

impl OwnerKey {
    /// Parse a PEM-encoded private key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        let inner = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| KeeperError::KeyFormat(format!("not an RSA private key: {e}")))?;
        Ok(Self { inner })
    }

    /// Read and parse a PEM-encoded private key from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_pem(&read_key_file(path)?)
    }

    /// The public key matching this private key.
    pub fn recipient(&self) -> RecipientKey {
        RecipientKey {
            inner: self.inner.to_public_key(),
        }
    }

    pub(crate) fn as_rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OwnerKey(<redacted>)")
    }
}

/// Generate a fresh RSA key pair of `bits` bits.
pub fn generate_key_pair(bits: usize) -> Result<OwnerKey> {
    if bits < MIN_KEY_BITS {
        return Err(KeeperError::KeyGeneration(format!(
            "key size must be at least {MIN_KEY_BITS} bits (got {bits})"
        )));
    }
    let inner = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| KeeperError::KeyGeneration(format!("RSA key generation failed: {e}")))?;
    Ok(OwnerKey { inner })
}

/// Generate a key pair and write it into `dir`.
///
/// Writes `keeper_private.pem` (PKCS#8, owner-only permissions on Unix)
/// and `keeper_public.pem` (SPKI).  Refuses to overwrite either file.
/// Returns the paths written as `(private, public)`.
pub fn write_key_pair(dir: &Path, bits: usize) -> Result<(PathBuf, PathBuf)> {
    let private_path = dir.join(PRIVATE_KEY_FILE);
    let public_path = dir.join(PUBLIC_KEY_FILE);

    for path in [&private_path, &public_path] {
        if path.exists() {
            return Err(KeeperError::KeyGeneration(format!(
                "key file already exists at {}",
                path.display()
            )));
        }
    }

    let owner = generate_key_pair(bits)?;
    let private_pem = owner
        .inner
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeeperError::KeyFormat(format!("cannot encode private key: {e}")))?;
    let public_pem = owner.recipient().to_pem()?;

    fs::create_dir_all(dir)?;
    fs::write(&private_path, private_pem.as_bytes())?;

    // On Unix, restrict the private key to owner-only read/write.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&private_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::write(&public_path, public_pem)?;

    Ok((private_path, public_path))
}

fn read_key_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        KeeperError::KeyFormat(format!("cannot read key file {}: {e}", path.display()))
    })
}
