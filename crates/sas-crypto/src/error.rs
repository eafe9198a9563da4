/// Errors from signing, verification and signed-message parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("signing failed: {0}")]
    SigningFailed(&'static str),

    #[error("malformed {what}: expected {expected} bytes, got {got}")]
    MalformedInput {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("signature verification failed")]
    VerificationFailure,
}
