//! Signature verification.
//!
//! A signature that does not verify is a normal outcome and is reported as
//! `Ok(false)`. Only inputs of the wrong size are errors, and those are
//! rejected before any hashing or curve arithmetic happens.

use ed25519_dalek::{Signature, VerifyingKey};

use crate::error::CryptoError;
use crate::hash::sha512;
use crate::{SAS_PUBLIC_BYTES, SIGNATURE_BYTES};

/// Verify a detached signature over `SHA-512(message)`.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
    let public_key = fixed::<SAS_PUBLIC_BYTES>("signing public key", public_key)?;
    let signature = fixed::<SIGNATURE_BYTES>("signature", signature)?;

    // Not a point on the curve: nothing can verify against it.
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key) else {
        return Ok(false);
    };
    let sig = Signature::from_bytes(&signature);
    let digest = sha512(message);

    Ok(verifying_key.verify_strict(&digest, &sig).is_ok())
}

/// Open a combined-mode block `signature || plaintext` and return the
/// plaintext if the signature verifies under `public_key`.
pub fn open_signed_block<'a>(
    block: &'a [u8],
    public_key: &[u8; SAS_PUBLIC_BYTES],
) -> Result<&'a [u8], CryptoError> {
    if block.len() < SIGNATURE_BYTES {
        return Err(CryptoError::VerificationFailure);
    }
    let (sig_bytes, plaintext) = block.split_at(SIGNATURE_BYTES);
    let signature = fixed::<SIGNATURE_BYTES>("signature", sig_bytes)?;

    let verifying_key =
        VerifyingKey::from_bytes(public_key).map_err(|_| CryptoError::VerificationFailure)?;
    verifying_key
        .verify_strict(plaintext, &Signature::from_bytes(&signature))
        .map_err(|_| CryptoError::VerificationFailure)?;

    Ok(plaintext)
}

fn fixed<const N: usize>(what: &'static str, bytes: &[u8]) -> Result<[u8; N], CryptoError> {
    <[u8; N]>::try_from(bytes).map_err(|_| CryptoError::MalformedInput {
        what,
        expected: N,
        got: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{sign, sign_block};
    use ed25519_dalek::SigningKey;
    use rand_core::OsRng;

    fn keypair() -> (SigningKey, [u8; 32]) {
        let key = SigningKey::generate(&mut OsRng);
        let public = key.verifying_key().to_bytes();
        (key, public)
    }

    #[test]
    fn test_hello_scenario() {
        let (key, public) = keypair();
        let signed = sign(&key.to_keypair_bytes(), b"hello").unwrap();

        assert_eq!(signed.signature_hex().len(), 128);
        assert!(verify(&public, b"hello", signed.signature()).unwrap());
        assert!(!verify(&public, b"hellp", signed.signature()).unwrap());
    }

    #[test]
    fn test_wrong_key_is_false_not_error() {
        let (key, _) = keypair();
        let (_, other_public) = keypair();
        let signed = sign(&key.to_bytes(), b"message").unwrap();

        assert_eq!(verify(&other_public, b"message", signed.signature()), Ok(false));
    }

    #[test]
    fn test_raw_message_signature_does_not_verify() {
        // Signatures are over the digest, so a plain Ed25519 signature of the
        // raw message must not be accepted.
        use ed25519_dalek::Signer;
        let (key, public) = keypair();
        let raw = key.sign(b"message").to_bytes();

        assert_eq!(verify(&public, b"message", &raw), Ok(false));
    }

    #[test]
    fn test_malformed_lengths() {
        let (_, public) = keypair();

        assert!(matches!(
            verify(&public, b"m", &[0u8; 63]),
            Err(CryptoError::MalformedInput { what: "signature", expected: 64, got: 63 })
        ));
        assert!(matches!(
            verify(&public[..31], b"m", &[0u8; 64]),
            Err(CryptoError::MalformedInput { expected: 32, got: 31, .. })
        ));
    }

    #[test]
    fn test_invalid_curve_point_is_false() {
        // y = 2 does not decompress to a curve point
        let mut bogus = [0u8; 32];
        bogus[0] = 2;
        assert_eq!(verify(&bogus, b"m", &[0u8; 64]), Ok(false));
    }

    #[test]
    fn test_open_signed_block_round_trip() {
        let (key, public) = keypair();
        let sid = [0xAA; 32];
        let block = sign_block(&key, &sid);

        assert_eq!(open_signed_block(&block, &public).unwrap(), &sid[..]);
    }

    #[test]
    fn test_open_signed_block_rejects_other_plaintext() {
        let (key, public) = keypair();
        let mut block = sign_block(&key, &[0xAA; 32]);
        let last = block.len() - 1;
        block[last] ^= 0x01;

        assert_eq!(
            open_signed_block(&block, &public),
            Err(CryptoError::VerificationFailure)
        );
    }

    #[test]
    fn test_open_signed_block_short_block() {
        let (_, public) = keypair();
        assert_eq!(
            open_signed_block(&[0u8; 10], &public),
            Err(CryptoError::VerificationFailure)
        );
    }
}
