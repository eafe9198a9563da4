//! Error types for the signing core.
//!
//! Each layer has its own `thiserror` enum. [`CoreError`] unifies them for the
//! exposed operations, and [`CoreError::kind`] flattens any error into the
//! [`ErrorKind`] list callers branch on.

use std::fmt;

use thiserror::Error;

use sas_crypto::CryptoError;
use sas_transport::{SidParseError, TransportError};

// ============================================================================
// Keyring errors
// ============================================================================

/// Keyring storage and identity errors.
#[derive(Debug, Error)]
pub enum KeyringError {
    /// Reading, writing or decoding the keyring file failed.
    #[error("keyring storage error: {0}")]
    Storage(String),

    #[error("keyring IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No unlocked context has room for another identity.
    #[error("keyring full: no unlocked context has room for another identity")]
    Full,

    #[error("identity not found: {0}")]
    IdentityNotFound(String),

    /// An identity record decrypted but its contents are malformed.
    #[error("corrupt identity record: {0}")]
    CorruptRecord(&'static str),
}

impl From<serde_json::Error> for KeyringError {
    fn from(e: serde_json::Error) -> Self {
        KeyringError::Storage(e.to_string())
    }
}

// ============================================================================
// Resolver errors
// ============================================================================

/// Failures of a single SID:SAS resolution attempt.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A request for this SID was sent too recently.
    #[error("SAS request for {sid} suppressed: last attempt {elapsed_ms}ms ago")]
    TooSoon { sid: String, elapsed_ms: u64 },

    /// No usable response arrived before the deadline.
    #[error("timed out waiting for SAS of {sid}")]
    Timeout { sid: String },

    #[error("unsupported key type in SAS response: {0:#04x}")]
    UnsupportedKeyType(u8),

    #[error("truncated SAS response: {got} bytes, need {needed}")]
    TruncatedResponse { needed: usize, got: usize },

    /// The mapping signature does not verify under the offered key.
    #[error("SAS mapping signature did not verify")]
    VerificationFailure,

    /// The signed plaintext is not the responder's SID.
    #[error("SAS mapping is inconsistent: {0}")]
    ProtocolInconsistency(&'static str),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ============================================================================
// Unified error
// ============================================================================

/// Any error produced by the exposed operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Caller-supplied text had the wrong length or encoding.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Keyring(#[from] KeyringError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<SidParseError> for CoreError {
    fn from(e: SidParseError) -> Self {
        CoreError::InvalidInput(format!("SID: {e}"))
    }
}

/// Flat classification of every failure the core can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    BufferTooSmall,
    StorageError,
    KeyringFull,
    IdentityNotFound,
    SigningFailed,
    MalformedInput,
    TooSoon,
    Timeout,
    UnsupportedKeyType,
    TruncatedResponse,
    VerificationFailure,
    ProtocolInconsistency,
    TransportError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::BufferTooSmall => "buffer_too_small",
            ErrorKind::StorageError => "storage_error",
            ErrorKind::KeyringFull => "keyring_full",
            ErrorKind::IdentityNotFound => "identity_not_found",
            ErrorKind::SigningFailed => "signing_failed",
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::TooSoon => "too_soon",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UnsupportedKeyType => "unsupported_key_type",
            ErrorKind::TruncatedResponse => "truncated_response",
            ErrorKind::VerificationFailure => "verification_failure",
            ErrorKind::ProtocolInconsistency => "protocol_inconsistency",
            ErrorKind::TransportError => "transport_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn crypto_kind(e: &CryptoError) -> ErrorKind {
    match e {
        CryptoError::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
        CryptoError::SigningFailed(_) => ErrorKind::SigningFailed,
        CryptoError::MalformedInput { .. } => ErrorKind::MalformedInput,
        CryptoError::VerificationFailure => ErrorKind::VerificationFailure,
    }
}

impl KeyringError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KeyringError::Storage(_) | KeyringError::Io(_) | KeyringError::CorruptRecord(_) => {
                ErrorKind::StorageError
            }
            KeyringError::Full => ErrorKind::KeyringFull,
            KeyringError::IdentityNotFound(_) => ErrorKind::IdentityNotFound,
        }
    }
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::TooSoon { .. } => ErrorKind::TooSoon,
            ResolveError::Timeout { .. } => ErrorKind::Timeout,
            ResolveError::UnsupportedKeyType(_) => ErrorKind::UnsupportedKeyType,
            ResolveError::TruncatedResponse { .. } => ErrorKind::TruncatedResponse,
            ResolveError::VerificationFailure => ErrorKind::VerificationFailure,
            ResolveError::ProtocolInconsistency(_) => ErrorKind::ProtocolInconsistency,
            ResolveError::Transport(_) => ErrorKind::TransportError,
        }
    }
}

impl CoreError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            CoreError::Crypto(e) => crypto_kind(e),
            CoreError::Keyring(e) => e.kind(),
            CoreError::Resolve(e) => e.kind(),
            CoreError::Transport(_) => ErrorKind::TransportError,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
