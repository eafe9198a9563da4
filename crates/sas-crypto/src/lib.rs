//! Message signing primitives for mesh identities.
//!
//! Signatures are hash-then-sign: the signer computes `SHA-512(message)` and
//! produces a 64-byte Ed25519 signature over that digest. A signed message is
//! laid out as `[message][signature]`.
//!
//! The crate also provides the combined-mode `signature || plaintext` blocks
//! used by the SID:SAS mapping protocol, where the plaintext is signed as-is.

#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod hash;
pub mod signer;
pub mod verifier;

#[cfg(test)]
mod proptests;

pub use codec::{encode_signed, SignedMessage};
pub use error::CryptoError;
pub use signer::{sign, sign_block, sign_detached};
pub use verifier::{open_signed_block, verify};

/// Length of a detached signature in bytes.
pub const SIGNATURE_BYTES: usize = 64;

/// Length of a signing public key (SAS) in bytes.
pub const SAS_PUBLIC_BYTES: usize = 32;

/// Length of a signing private key as handed out by the keyring
/// (`seed || public key`).
pub const SAS_SECRET_BYTES: usize = 64;

/// Length of a bare signing key seed.
pub const SAS_SEED_BYTES: usize = 32;
