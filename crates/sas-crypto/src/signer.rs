//! Signature creation.

use ed25519_dalek::{Signature, Signer, SigningKey};
use zeroize::Zeroizing;

use crate::codec::SignedMessage;
use crate::error::CryptoError;
use crate::hash::sha512;
use crate::{SAS_SECRET_BYTES, SAS_SEED_BYTES, SIGNATURE_BYTES};

/// Rebuild a signing key from raw key material.
///
/// Accepts either a 32-byte seed or the 64-byte `seed || public` form the
/// keyring exports. In the 64-byte form the public half must match the seed.
pub fn signing_key_from_bytes(private_key: &[u8]) -> Result<SigningKey, CryptoError> {
    match private_key.len() {
        SAS_SEED_BYTES => {
            let mut seed = Zeroizing::new([0u8; SAS_SEED_BYTES]);
            seed.copy_from_slice(private_key);
            Ok(SigningKey::from_bytes(&seed))
        }
        SAS_SECRET_BYTES => {
            let mut keypair = Zeroizing::new([0u8; SAS_SECRET_BYTES]);
            keypair.copy_from_slice(private_key);
            SigningKey::from_keypair_bytes(&keypair)
                .map_err(|_| CryptoError::SigningFailed("public half does not match seed"))
        }
        _ => Err(CryptoError::SigningFailed("private key must be 32 or 64 bytes")),
    }
}

/// Sign `SHA-512(message)` and return the detached 64-byte signature.
pub fn sign_detached(
    private_key: &[u8],
    message: &[u8],
) -> Result<[u8; SIGNATURE_BYTES], CryptoError> {
    let key = signing_key_from_bytes(private_key)?;
    let digest = sha512(message);
    let signature: Signature = key.sign(&digest);
    Ok(signature.to_bytes())
}

/// Sign a message and return it in the `[message][signature]` layout.
pub fn sign(private_key: &[u8], message: &[u8]) -> Result<SignedMessage, CryptoError> {
    let signature = sign_detached(private_key, message)?;
    Ok(SignedMessage::new(message, &signature))
}

/// Produce a combined-mode block `signature || plaintext`.
///
/// Unlike [`sign`], the plaintext is signed directly, not its hash. This is
/// the form a peer uses to prove that its SID belongs to its signing key.
pub fn sign_block(key: &SigningKey, plaintext: &[u8]) -> Vec<u8> {
    let signature: Signature = key.sign(plaintext);
    let mut block = Vec::with_capacity(SIGNATURE_BYTES + plaintext.len());
    block.extend_from_slice(&signature.to_bytes());
    block.extend_from_slice(plaintext);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn test_sign_produces_message_then_signature() {
        let key = SigningKey::generate(&mut OsRng);
        let signed = sign(&key.to_bytes(), b"hello").unwrap();

        assert_eq!(signed.message(), b"hello");
        assert_eq!(signed.signature().len(), SIGNATURE_BYTES);
        assert_eq!(signed.signature_hex().len(), 128);
    }

    #[test]
    fn test_seed_and_keypair_forms_agree() {
        let key = SigningKey::generate(&mut OsRng);
        let from_seed = sign_detached(&key.to_bytes(), b"msg").unwrap();
        let from_pair = sign_detached(&key.to_keypair_bytes(), b"msg").unwrap();

        // Ed25519 is deterministic
        assert_eq!(from_seed, from_pair);
    }

    #[test]
    fn test_rejects_wrong_length_key() {
        let err = sign(&[1u8; 31], b"msg").unwrap_err();
        assert!(matches!(err, CryptoError::SigningFailed(_)));
    }

    #[test]
    fn test_rejects_mismatched_keypair() {
        let a = SigningKey::generate(&mut OsRng);
        let b = SigningKey::generate(&mut OsRng);
        let mut bogus = [0u8; SAS_SECRET_BYTES];
        bogus[..32].copy_from_slice(&a.to_bytes());
        bogus[32..].copy_from_slice(b.verifying_key().as_bytes());

        assert!(matches!(
            sign_detached(&bogus, b"msg"),
            Err(CryptoError::SigningFailed(_))
        ));
    }

    #[test]
    fn test_sign_block_layout() {
        let key = SigningKey::generate(&mut OsRng);
        let block = sign_block(&key, &[0x42; 32]);

        assert_eq!(block.len(), SIGNATURE_BYTES + 32);
        assert_eq!(&block[SIGNATURE_BYTES..], &[0x42; 32]);
    }
}
