//! `[message][signature]` wire layout.

use crate::error::CryptoError;
use crate::SIGNATURE_BYTES;

/// A message with its detached signature appended.
///
/// The first `message_len` bytes are the message, the trailing
/// [`SIGNATURE_BYTES`] bytes are the signature over `SHA-512(message)`.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedMessage {
    buf: Vec<u8>,
    message_len: usize,
}

impl SignedMessage {
    /// Join a message and its signature.
    pub fn new(message: &[u8], signature: &[u8; SIGNATURE_BYTES]) -> Self {
        let mut buf = Vec::with_capacity(message.len() + SIGNATURE_BYTES);
        buf.extend_from_slice(message);
        buf.extend_from_slice(signature);
        Self {
            buf,
            message_len: message.len(),
        }
    }

    /// Split a received buffer into message and trailing signature.
    pub fn parse(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < SIGNATURE_BYTES {
            return Err(CryptoError::BufferTooSmall {
                needed: SIGNATURE_BYTES,
                available: bytes.len(),
            });
        }
        Ok(Self {
            buf: bytes.to_vec(),
            message_len: bytes.len() - SIGNATURE_BYTES,
        })
    }

    pub fn message(&self) -> &[u8] {
        &self.buf[..self.message_len]
    }

    pub fn signature(&self) -> &[u8] {
        &self.buf[self.message_len..]
    }

    /// Signature as a fixed-size array.
    pub fn signature_bytes(&self) -> [u8; SIGNATURE_BYTES] {
        let mut sig = [0u8; SIGNATURE_BYTES];
        sig.copy_from_slice(self.signature());
        sig
    }

    /// Lowercase hex of the signature only (128 characters).
    pub fn signature_hex(&self) -> String {
        hex::encode(self.signature())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl std::fmt::Debug for SignedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedMessage")
            .field("message_len", &self.message_len)
            .field("signature", &hex::encode(&self.signature()[..8]))
            .finish()
    }
}

/// Write `message || signature` into a caller-provided buffer.
///
/// Returns the number of bytes written. Nothing is written when `dest` is
/// too small.
pub fn encode_signed(
    message: &[u8],
    signature: &[u8; SIGNATURE_BYTES],
    dest: &mut [u8],
) -> Result<usize, CryptoError> {
    let needed = message.len() + SIGNATURE_BYTES;
    if dest.len() < needed {
        return Err(CryptoError::BufferTooSmall {
            needed,
            available: dest.len(),
        });
    }
    dest[..message.len()].copy_from_slice(message);
    dest[message.len()..needed].copy_from_slice(signature);
    Ok(needed)
}
