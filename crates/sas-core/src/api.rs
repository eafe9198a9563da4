//! The exposed signing and verification operations.
//!
//! Hex arguments must have exactly twice the binary length and are rejected
//! with [`CoreError::InvalidInput`] before any keyring or crypto work. Hex
//! output is lowercase.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use sas_crypto::{
    SignedMessage, SAS_PUBLIC_BYTES, SAS_SECRET_BYTES, SAS_SEED_BYTES, SIGNATURE_BYTES,
};
use sas_transport::{MeshTransport, Sid};

use crate::cache::PeerCache;
use crate::config::ResolverConfig;
use crate::errors::{CoreError, ErrorKind, KeyringError, Result};
use crate::keyring::Keyring;
use crate::resolver::{SasResolver, Shutdown};

/// A signature together with the identity that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutput {
    pub sid: Sid,
    pub signature_hex: String,
}

/// Sign `message` with the identity `sid_hex`, or with a newly created
/// identity when no SID is given.
///
/// The keyring at `keyring_path` (default location when `None`) is opened
/// with `pin` and created if necessary.
pub fn sign_as(
    sid_hex: Option<&str>,
    message: &[u8],
    keyring_path: Option<&Path>,
    pin: &str,
) -> Result<SignOutput> {
    let requested = sid_hex.map(str::parse::<Sid>).transpose()?;

    let mut keyring = Keyring::open_or_create(keyring_path, pin)?;
    let sid = keyring.resolve_or_create(requested.as_ref(), pin)?;
    let (private_key, _) = keyring.extract_signing_key(&sid)?;

    let signed = sas_crypto::sign(private_key.as_slice(), message)?;
    debug!(sid = %sid.short(), len = message.len(), "Signed message");

    Ok(SignOutput {
        sid,
        signature_hex: signed.signature_hex(),
    })
}

/// Sign `message` and return the 128-character hex signature.
pub fn sign(
    sid_hex: Option<&str>,
    message: &[u8],
    keyring_path: Option<&Path>,
    pin: &str,
) -> Result<String> {
    sign_as(sid_hex, message, keyring_path, pin).map(|out| out.signature_hex)
}

/// Verify a hex signature against a hex signing public key.
pub fn verify(sas_hex: &str, signature_hex: &str, message: &[u8]) -> Result<bool> {
    let sas: [u8; SAS_PUBLIC_BYTES] = decode_hex("SAS", sas_hex)?;
    let signature: [u8; SIGNATURE_BYTES] = decode_hex("signature", signature_hex)?;

    Ok(sas_crypto::verify(&sas, message, &signature)?)
}

/// Hex-encoded raw signing key (`seed || public`) of `sid_hex`.
pub fn export_signing_key(
    sid_hex: &str,
    keyring_path: Option<&Path>,
    pin: &str,
) -> Result<Zeroizing<String>> {
    let sid: Sid = sid_hex.parse()?;
    let private_key = Keyring::export_signing_key(keyring_path, pin, &sid)?;
    Ok(Zeroizing::new(hex::encode(private_key.as_slice())))
}

/// Sign `message` with a raw hex signing key as produced by
/// [`export_signing_key`]: a 64-character seed or a 128-character
/// `seed || public` pair. Returns the 128-character hex signature.
pub fn sign_with_key(key_hex: &str, message: &[u8]) -> Result<String> {
    let key: Zeroizing<Vec<u8>> = match key_hex.len() {
        n if n == 2 * SAS_SEED_BYTES => {
            Zeroizing::new(decode_hex::<SAS_SEED_BYTES>("signing key", key_hex)?.to_vec())
        }
        _ => Zeroizing::new(decode_hex::<SAS_SECRET_BYTES>("signing key", key_hex)?.to_vec()),
    };

    let signature = sas_crypto::sign_detached(key.as_slice(), message)?;
    Ok(hex::encode(signature))
}

fn decode_hex<const N: usize>(what: &str, text: &str) -> Result<[u8; N]> {
    if text.len() != 2 * N {
        return Err(CoreError::InvalidInput(format!(
            "{what} must be {} hex characters, got {}",
            2 * N,
            text.len()
        )));
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(text, &mut out)
        .map_err(|_| CoreError::InvalidInput(format!("{what} is not valid hex")))?;
    Ok(out)
}

/// An unlocked keyring, the local identity and a resolver for peer keys.
pub struct Session<T> {
    keyring: Keyring,
    local_sid: Sid,
    resolver: SasResolver<T>,
    shutdown: Shutdown,
}

impl<T: MeshTransport> Session<T> {
    /// Open the keyring and use its first visible identity as the local SID.
    pub fn open(
        keyring_path: Option<&Path>,
        pin: &str,
        transport: Arc<T>,
        cache: Arc<PeerCache>,
        config: ResolverConfig,
    ) -> Result<Self> {
        let keyring = Keyring::open_or_create(keyring_path, pin)?;
        let local_sid = keyring
            .identities()
            .next()
            .map(|identity| identity.sid())
            .ok_or_else(|| KeyringError::IdentityNotFound("no visible identity".into()))?;

        Ok(Self {
            keyring,
            local_sid,
            resolver: SasResolver::new(transport, cache, local_sid, config),
            shutdown: Shutdown::new(),
        })
    }

    pub fn local_sid(&self) -> Sid {
        self.local_sid
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    pub fn resolver(&self) -> &SasResolver<T> {
        &self.resolver
    }

    /// Token that aborts any resolution in progress when triggered.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Sign `message` as the local identity.
    pub fn sign(&self, message: &[u8]) -> Result<SignedMessage> {
        let identity = self
            .keyring
            .lookup(&self.local_sid)
            .ok_or_else(|| KeyringError::IdentityNotFound(self.local_sid.to_hex()))?;
        Ok(identity.sign(message)?)
    }

    /// Resolve a peer SID to its signing public key.
    pub fn resolve(&self, sid_hex: &str) -> Result<[u8; SAS_PUBLIC_BYTES]> {
        let sid: Sid = sid_hex.parse()?;
        Ok(self.resolver.resolve(&sid, &self.shutdown)?)
    }

    /// Verify a signature made by the owner of `sid_hex`, resolving its
    /// signing key first if it is not cached.
    ///
    /// Resolution failures are returned as errors.
    pub fn try_verify_by_address(
        &self,
        sid_hex: &str,
        signature_hex: &str,
        message: &[u8],
    ) -> Result<bool> {
        let sid: Sid = sid_hex.parse()?;
        let signature: [u8; SIGNATURE_BYTES] = decode_hex("signature", signature_hex)?;

        let sas = self.resolver.resolve(&sid, &self.shutdown)?;
        Ok(sas_crypto::verify(&sas, message, &signature)?)
    }

    /// Like [`Session::try_verify_by_address`], but a signature whose key
    /// cannot be resolved simply does not verify.
    pub fn verify_by_address(
        &self,
        sid_hex: &str,
        signature_hex: &str,
        message: &[u8],
    ) -> Result<bool> {
        match self.try_verify_by_address(sid_hex, signature_hex, message) {
            Err(e) if e.kind() != ErrorKind::InvalidInput => {
                warn!(sid = %sid_hex, kind = %e.kind(), error = %e, "Could not resolve signer, treating as unverified");
                Ok(false)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_transport::MockTransport;
    use tempfile::TempDir;

    fn keyring_path(dir: &TempDir) -> std::path::PathBuf {
        dir.path().join("serval.keyring")
    }

    #[test]
    fn test_sign_then_verify_hello() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);

        let out = sign_as(None, b"hello", Some(path.as_path()), "").unwrap();
        let keyring = Keyring::open_or_create(Some(path.as_path()), "").unwrap();
        let (_, public) = keyring.extract_signing_key(&out.sid).unwrap();
        let sas_hex = hex::encode(public);

        assert_eq!(out.signature_hex.len(), 128);
        assert_eq!(out.signature_hex, out.signature_hex.to_lowercase());
        assert!(verify(&sas_hex, &out.signature_hex, b"hello").unwrap());
        assert!(!verify(&sas_hex, &out.signature_hex, b"hellp").unwrap());
    }

    #[test]
    fn test_sign_with_existing_sid_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let sid = sign_as(None, b"x", Some(path.as_path()), "").unwrap().sid.to_hex();

        let a = sign(Some(sid.as_str()), b"message", Some(path.as_path()), "").unwrap();
        let b = sign(Some(sid.as_str()), b"message", Some(path.as_path()), "").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sign_unknown_sid() {
        let dir = TempDir::new().unwrap();
        let err = sign(Some("ab".repeat(32).as_str()), b"m", Some(keyring_path(&dir).as_path()), "").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IdentityNotFound);
    }

    #[test]
    fn test_sign_bad_sid_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let err = sign(Some("abc"), b"m", Some(path.as_path()), "").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(!path.exists());
    }

    #[test]
    fn test_verify_rejects_bad_lengths() {
        let sas = "00".repeat(32);
        let sig = "00".repeat(64);

        for (sas_hex, sig_hex) in [
            (&"00".repeat(31), &sig),
            (&sas, &"00".repeat(63)),
            (&sas, &"00".repeat(65)),
            (&"zz".repeat(32), &sig),
        ] {
            let err = verify(sas_hex, sig_hex, b"m").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_export_signing_key_matches_sas() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let out = sign_as(None, b"x", Some(path.as_path()), "").unwrap();

        let exported = export_signing_key(&out.sid.to_hex(), Some(path.as_path()), "").unwrap();
        let raw = hex::decode(exported.as_str()).unwrap();
        let detached = sas_crypto::sign_detached(&raw, b"x").unwrap();

        assert_eq!(hex::encode(detached), out.signature_hex);
    }

    #[test]
    fn test_sign_with_exported_key() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let out = sign_as(None, b"packet", Some(path.as_path()), "").unwrap();
        let exported = export_signing_key(&out.sid.to_hex(), Some(path.as_path()), "").unwrap();

        let from_pair = sign_with_key(exported.as_str(), b"packet").unwrap();
        let from_seed = sign_with_key(&exported[..64], b"packet").unwrap();

        assert_eq!(from_pair, out.signature_hex);
        assert_eq!(from_seed, out.signature_hex);
    }

    #[test]
    fn test_sign_with_key_rejects_bad_input() {
        for key in ["", "ab", "zz".repeat(32).as_str(), "ab".repeat(48).as_str()] {
            let err = sign_with_key(key, b"m").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{key}");
        }

        // Right length, but the public half does not belong to the seed.
        let err = sign_with_key(&"01".repeat(64), b"m").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SigningFailed);
    }

    #[test]
    fn test_session_signs_as_local_identity() {
        let dir = TempDir::new().unwrap();
        let session = Session::open(
            Some(keyring_path(&dir).as_path()),
            "",
            Arc::new(MockTransport::new()),
            Arc::new(PeerCache::new()),
            ResolverConfig::default(),
        )
        .unwrap();

        let signed = session.sign(b"hello").unwrap();
        let identity = session.keyring().lookup(&session.local_sid()).unwrap();
        assert!(sas_crypto::verify(&identity.sas_public(), b"hello", signed.signature()).unwrap());
    }

    #[test]
    fn test_verify_by_address_bad_input_is_error() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(MockTransport::new());
        let session = Session::open(
            Some(keyring_path(&dir).as_path()),
            "",
            transport.clone(),
            Arc::new(PeerCache::new()),
            ResolverConfig::default(),
        )
        .unwrap();

        let err = session
            .verify_by_address("1234", &"00".repeat(64), b"m")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = session
            .verify_by_address(&"ab".repeat(32), "00", b"m")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(transport.total_calls(), 0);
    }
}
