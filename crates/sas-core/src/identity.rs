//! Mesh identities: a subscriber ID bound to an Ed25519 signing key.
//!
//! The SID is the X25519 public key of a per-identity key-agreement secret,
//! so knowing the signing key tells nothing about the SID and vice versa.
//! Peers learn the binding through the signed SID:SAS mapping produced by
//! [`Identity::sas_proof`].

use std::fmt;

use chrono::{DateTime, Utc};
use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use sas_crypto::{sign_block, CryptoError, SignedMessage, SAS_PUBLIC_BYTES, SAS_SECRET_BYTES};
use sas_transport::{Sid, SID_SIZE};

/// Length of the secret material sealed in the keyring
/// (`sid_secret || signing_seed`).
pub(crate) const IDENTITY_SECRET_BYTES: usize = 64;

/// One keyring identity.
#[derive(Clone)]
pub struct Identity {
    sid_secret: StaticSecret,
    sid: Sid,
    signing_key: SigningKey,
    created_at: DateTime<Utc>,
}

impl Identity {
    /// Generate a fresh identity from the OS RNG.
    pub fn generate() -> Self {
        let sid_secret = StaticSecret::random_from_rng(OsRng);
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_parts(sid_secret, signing_key, Utc::now())
    }

    fn from_parts(sid_secret: StaticSecret, signing_key: SigningKey, created_at: DateTime<Utc>) -> Self {
        let sid = Sid::from_bytes(PublicKey::from(&sid_secret).to_bytes());
        Self {
            sid_secret,
            sid,
            signing_key,
            created_at,
        }
    }

    /// Rebuild an identity from the bytes produced by [`Identity::secret_bytes`].
    pub(crate) fn from_secret_bytes(
        bytes: &[u8],
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        if bytes.len() != IDENTITY_SECRET_BYTES {
            return None;
        }
        let mut sid_secret = Zeroizing::new([0u8; SID_SIZE]);
        sid_secret.copy_from_slice(&bytes[..SID_SIZE]);
        let mut seed = Zeroizing::new([0u8; 32]);
        seed.copy_from_slice(&bytes[SID_SIZE..]);

        Some(Self::from_parts(
            StaticSecret::from(*sid_secret),
            SigningKey::from_bytes(&seed),
            created_at,
        ))
    }

    pub(crate) fn secret_bytes(&self) -> Zeroizing<[u8; IDENTITY_SECRET_BYTES]> {
        let mut out = Zeroizing::new([0u8; IDENTITY_SECRET_BYTES]);
        out[..SID_SIZE].copy_from_slice(self.sid_secret.as_bytes());
        out[SID_SIZE..].copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    pub fn sid(&self) -> Sid {
        self.sid
    }

    /// The signing public key (SAS).
    pub fn sas_public(&self) -> [u8; SAS_PUBLIC_BYTES] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The private signing key in `seed || public` form.
    pub fn signing_keypair_bytes(&self) -> Zeroizing<[u8; SAS_SECRET_BYTES]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    /// Sign `message` with this identity's SAS key.
    pub fn sign(&self, message: &[u8]) -> Result<SignedMessage, CryptoError> {
        sas_crypto::sign(self.signing_keypair_bytes().as_slice(), message)
    }

    /// The combined-mode block `signature || sid` proving that this SID
    /// belongs to this signing key.
    pub fn sas_proof(&self) -> Vec<u8> {
        sign_block(&self.signing_key, self.sid.as_bytes())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("sid", &self.sid)
            .field("sas", &hex::encode(self.sas_public()))
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
