use thiserror::Error;

/// All errors that can occur in keeper.
#[derive(Debug, Error)]
pub enum KeeperError {
    // --- Crypto errors ---
    #[error("Invalid key: {0}")]
    KeyFormat(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Key wrapping failed: {0}")]
    AsymmetricWrap(String),

    #[error("Key unwrapping failed — wrong or mismatched private key")]
    Unwrap,

    #[error("Decryption failed — ciphertext was tampered with or the key is wrong")]
    AuthenticationFailure,

    // --- Transport errors ---
    #[error("Unauthorized — the server rejected the bearer token")]
    Unauthorized,

    #[error("Server unavailable: {0}")]
    Unavailable(String),

    #[error("Server error {status}: {message}")]
    ServerError { status: i32, message: String },

    #[error("Unexpected server response: {0}")]
    Protocol(String),

    // --- Resolution errors ---
    #[error("Unknown strategy '{0}' — expected server, client or interactive")]
    UnknownStrategy(String),

    #[error("Invalid choice '{0}' — expected 'server' or 'client'")]
    InvalidChoice(String),

    // --- Cache errors ---
    #[error("Cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    // --- Config errors ---
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("No bearer token — pass --token or set KEEPER_TOKEN")]
    MissingCredential,

    // --- Keyring errors ---
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI / engine errors ---
    #[error("Invalid secret name '{0}' — only ASCII letters, digits, underscores, hyphens, and periods are allowed (max 256)")]
    InvalidSecretName(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl KeeperError {
    /// Whether a transport adapter may retry the call that produced this error.
    pub fn is_transient(&self) -> bool {
        match self {
            KeeperError::Unavailable(_) => true,
            KeeperError::ServerError { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}

/// Convenience type alias for keeper results.
pub type Result<T> = std::result::Result<T, KeeperError>;
