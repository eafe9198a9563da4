//! PIN-protected keyring of mesh identities.
//!
//! The keyring file is JSON. It holds up to [`MAX_CONTEXTS`] contexts, each
//! bound to one PIN:
//! - a random salt, from which `HKDF-SHA256(salt, pin)` derives the context key
//! - a PIN check tag, `HMAC-SHA256(context key, label)`
//! - identity records sealed with ChaCha20-Poly1305 under the context key
//!
//! Unlocking with a PIN opens every context whose check tag matches. Contexts
//! for other PINs stay sealed and are written back unchanged on commit.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use chrono::{DateTime, Utc};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use sas_crypto::{SAS_PUBLIC_BYTES, SAS_SECRET_BYTES};
use sas_transport::Sid;

use crate::errors::KeyringError;
use crate::identity::Identity;

/// Maximum number of PIN contexts in one keyring.
pub const MAX_CONTEXTS: usize = 16;

/// Maximum number of identities held by one context.
pub const MAX_IDENTITIES_PER_CONTEXT: usize = 16;

const KEYRING_VERSION: u32 = 1;
const SALT_BYTES: usize = 16;
const NONCE_BYTES: usize = 12;

const CONTEXT_KEY_INFO: &[u8] = b"sas-keyring context key v1";
const PIN_CHECK_LABEL: &[u8] = b"sas-keyring pin check v1";
const IDENTITY_AAD: &[u8] = b"sas-keyring identity v1";

type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// On-disk format
// ============================================================================

#[derive(Serialize, Deserialize)]
struct KeyringFile {
    version: u32,
    contexts: Vec<StoredContext>,
}

#[derive(Clone, Serialize, Deserialize)]
struct StoredContext {
    /// HKDF salt (hex)
    salt: String,
    /// HMAC of [`PIN_CHECK_LABEL`] under the context key (hex)
    pin_check: String,
    identities: Vec<StoredIdentity>,
}

#[derive(Clone, Serialize, Deserialize)]
struct StoredIdentity {
    /// ChaCha20-Poly1305 nonce (hex)
    nonce: String,
    /// Sealed `sid_secret || signing_seed` (hex)
    sealed: String,
    /// RFC3339
    created_at: String,
}

// ============================================================================
// In-memory state
// ============================================================================

struct Context {
    salt: [u8; SALT_BYTES],
    pin_check: [u8; 32],
    /// Records as last read or written. Authoritative while locked.
    stored: Vec<StoredIdentity>,
    unlocked: Option<Unlocked>,
}

struct Unlocked {
    key: Zeroizing<[u8; 32]>,
    identities: Vec<Identity>,
}

impl Context {
    fn new(pin: &str) -> Result<Self, KeyringError> {
        let mut salt = [0u8; SALT_BYTES];
        getrandom::getrandom(&mut salt).map_err(|e| KeyringError::Storage(e.to_string()))?;
        let key = derive_context_key(&salt, pin)?;
        let pin_check = pin_check_tag(&key)?;

        Ok(Self {
            salt,
            pin_check,
            stored: Vec::new(),
            unlocked: Some(Unlocked {
                key,
                identities: Vec::new(),
            }),
        })
    }

    fn from_stored(stored: StoredContext) -> Result<Self, KeyringError> {
        Ok(Self {
            salt: decode_fixed("context salt", &stored.salt)?,
            pin_check: decode_fixed("pin check", &stored.pin_check)?,
            stored: stored.identities,
            unlocked: None,
        })
    }

    /// Derive the context key for `pin` if the check tag matches.
    fn key_for(&self, pin: &str) -> Result<Option<Zeroizing<[u8; 32]>>, KeyringError> {
        let key = derive_context_key(&self.salt, pin)?;
        let tag = pin_check_tag(&key)?;
        if constant_time_eq::constant_time_eq(&tag, &self.pin_check) {
            Ok(Some(key))
        } else {
            Ok(None)
        }
    }

    fn unlock_with(&mut self, key: Zeroizing<[u8; 32]>) -> Result<(), KeyringError> {
        let mut identities = Vec::with_capacity(self.stored.len());
        for record in &self.stored {
            identities.push(unseal_identity(&key, record)?);
        }
        self.unlocked = Some(Unlocked { key, identities });
        Ok(())
    }

    /// Refresh the sealed records from the unlocked identities.
    fn reseal(&mut self) -> Result<(), KeyringError> {
        if let Some(unlocked) = &self.unlocked {
            self.stored = unlocked
                .identities
                .iter()
                .map(|identity| seal_identity(&unlocked.key, identity))
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }

    fn to_stored(&self) -> StoredContext {
        StoredContext {
            salt: hex::encode(self.salt),
            pin_check: hex::encode(self.pin_check),
            identities: self.stored.clone(),
        }
    }

    /// Drop the most recently added identity and its sealed record.
    fn discard_last(&mut self) {
        if let Some(unlocked) = self.unlocked.as_mut() {
            unlocked.identities.pop();
            self.stored.truncate(unlocked.identities.len());
        }
    }

    fn has_room(&self) -> bool {
        self.unlocked
            .as_ref()
            .is_some_and(|u| u.identities.len() < MAX_IDENTITIES_PER_CONTEXT)
    }
}

// ============================================================================
// Keyring
// ============================================================================

/// An open keyring file.
///
/// Identities become visible only after [`Keyring::unlock`] with the PIN of
/// their context. Mutations stay in memory until [`Keyring::commit`].
pub struct Keyring {
    path: PathBuf,
    contexts: Vec<Context>,
}

impl Keyring {
    /// Default keyring location in the platform data directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "servalproject", "serval")
            .map(|dirs| dirs.data_dir().join("serval.keyring"))
    }

    /// Open the keyring at `path` without unlocking anything.
    ///
    /// A missing file is an empty keyring; it is created on the first commit.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, KeyringError> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "Keyring file absent, starting empty");
            return Ok(Self {
                path,
                contexts: Vec::new(),
            });
        }

        let mut file = fs::File::open(&path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let stored: KeyringFile = serde_json::from_str(&contents)?;
        if stored.version != KEYRING_VERSION {
            return Err(KeyringError::Storage(format!(
                "unsupported keyring version {}",
                stored.version
            )));
        }
        if stored.contexts.len() > MAX_CONTEXTS {
            return Err(KeyringError::Storage(format!(
                "keyring holds {} contexts, limit is {MAX_CONTEXTS}",
                stored.contexts.len()
            )));
        }

        let contexts = stored
            .contexts
            .into_iter()
            .map(Context::from_stored)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(path = %path.display(), contexts = contexts.len(), "Opened keyring");
        Ok(Self { path, contexts })
    }

    /// Open the keyring at `path` (or the default location), unlock it with
    /// `pin` and make sure at least one identity is visible.
    ///
    /// When nothing is visible under `pin`, a fresh identity is created and
    /// committed.
    pub fn open_or_create(path: Option<&Path>, pin: &str) -> Result<Self, KeyringError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path().ok_or_else(|| {
                KeyringError::Storage("no default keyring location on this platform".into())
            })?,
        };

        let mut keyring = Self::open(path)?;
        if keyring.unlock(pin)? == 0 {
            let sid = keyring.create_identity(pin)?.sid();
            info!(sid = %sid, "Seeded empty keyring with a new identity");
        }
        Ok(keyring)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlock every context protected by `pin`. Returns the number of
    /// identities visible afterwards.
    ///
    /// If no context matches, an empty one is opened for `pin` so identities
    /// can be created under it. It is persisted by the next commit.
    pub fn unlock(&mut self, pin: &str) -> Result<usize, KeyringError> {
        let mut matched = false;
        for (index, context) in self.contexts.iter_mut().enumerate() {
            let Some(key) = context.key_for(pin)? else {
                continue;
            };
            matched = true;
            if context.unlocked.is_none() {
                context.unlock_with(key)?;
                debug!(context = index, identities = context.stored.len(), "Unlocked keyring context");
            }
        }

        if !matched {
            if self.contexts.len() < MAX_CONTEXTS {
                self.contexts.push(Context::new(pin)?);
                debug!(context = self.contexts.len() - 1, "Opened new keyring context");
            } else {
                warn!(limit = MAX_CONTEXTS, "No keyring context matches PIN and no room for another");
            }
        }

        Ok(self.len())
    }

    /// Create a new identity in the first unlocked context with room and
    /// commit the keyring.
    pub fn create_identity(&mut self, pin: &str) -> Result<&Identity, KeyringError> {
        self.unlock(pin)?;

        let index = self
            .contexts
            .iter()
            .position(Context::has_room)
            .ok_or(KeyringError::Full)?;
        let identity = Identity::generate();
        let sid = identity.sid();
        if let Some(unlocked) = self.contexts[index].unlocked.as_mut() {
            unlocked.identities.push(identity);
        }

        if let Err(e) = self.commit() {
            self.contexts[index].discard_last();
            warn!(sid = %sid, error = %e, "Keyring commit failed, new identity discarded");
            return Err(e);
        }
        info!(sid = %sid, "Created identity");

        self.lookup(&sid)
            .ok_or_else(|| KeyringError::IdentityNotFound(sid.to_hex()))
    }

    /// Write the keyring to disk.
    ///
    /// The file is written to a temporary sibling, synced, then renamed over
    /// the original.
    pub fn commit(&mut self) -> Result<(), KeyringError> {
        for context in &mut self.contexts {
            context.reseal()?;
        }
        let file = KeyringFile {
            version: KEYRING_VERSION,
            contexts: self.contexts.iter().map(Context::to_stored).collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        let written = write_private(&temp_path, json.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        debug!(path = %self.path.display(), contexts = self.contexts.len(), "Committed keyring");
        Ok(())
    }

    /// Find a visible identity by SID.
    pub fn lookup(&self, sid: &Sid) -> Option<&Identity> {
        self.identities().find(|identity| identity.sid() == *sid)
    }

    /// All identities visible under the PINs unlocked so far, in keyring order.
    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.contexts
            .iter()
            .filter_map(|c| c.unlocked.as_ref())
            .flat_map(|u| u.identities.iter())
    }

    pub fn len(&self) -> usize {
        self.identities().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The private (`seed || public`) and public signing keys of `sid`.
    pub fn extract_signing_key(
        &self,
        sid: &Sid,
    ) -> Result<(Zeroizing<[u8; SAS_SECRET_BYTES]>, [u8; SAS_PUBLIC_BYTES]), KeyringError> {
        let identity = self
            .lookup(sid)
            .ok_or_else(|| KeyringError::IdentityNotFound(sid.to_hex()))?;
        Ok((identity.signing_keypair_bytes(), identity.sas_public()))
    }

    /// Return `sid` if it is visible, or create a new identity when no SID
    /// is given.
    pub fn resolve_or_create(&mut self, sid: Option<&Sid>, pin: &str) -> Result<Sid, KeyringError> {
        match sid {
            Some(sid) => self
                .lookup(sid)
                .map(Identity::sid)
                .ok_or_else(|| KeyringError::IdentityNotFound(sid.to_hex())),
            None => Ok(self.create_identity(pin)?.sid()),
        }
    }

    /// Open the keyring and hand out the raw signing key of `sid`, for
    /// callers that sign many packets without going through the keyring.
    pub fn export_signing_key(
        path: Option<&Path>,
        pin: &str,
        sid: &Sid,
    ) -> Result<Zeroizing<[u8; SAS_SECRET_BYTES]>, KeyringError> {
        let keyring = Self::open_or_create(path, pin)?;
        let (private_key, _) = keyring.extract_signing_key(sid)?;
        info!(sid = %sid, "Exported signing key");
        Ok(private_key)
    }
}

/// Write `contents` to a new file at `path`, synced, with owner-only access.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut out = fs::File::create(path)?;
    out.write_all(contents)?;
    out.sync_all()?;
    drop(out);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

// ============================================================================
// Key derivation and sealing
// ============================================================================

fn derive_context_key(salt: &[u8], pin: &str) -> Result<Zeroizing<[u8; 32]>, KeyringError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), pin.as_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(CONTEXT_KEY_INFO, key.as_mut_slice())
        .map_err(|_| KeyringError::Storage("context key derivation failed".into()))?;
    Ok(key)
}

fn pin_check_tag(key: &[u8; 32]) -> Result<[u8; 32], KeyringError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|_| KeyringError::Storage("invalid context key".into()))?;
    mac.update(PIN_CHECK_LABEL);
    let mut tag = [0u8; 32];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

fn seal_identity(key: &[u8; 32], identity: &Identity) -> Result<StoredIdentity, KeyringError> {
    let mut nonce = [0u8; NONCE_BYTES];
    getrandom::getrandom(&mut nonce).map_err(|e| KeyringError::Storage(e.to_string()))?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let secret = identity.secret_bytes();
    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: secret.as_slice(),
                aad: IDENTITY_AAD,
            },
        )
        .map_err(|_| KeyringError::Storage("identity encryption failed".into()))?;

    Ok(StoredIdentity {
        nonce: hex::encode(nonce),
        sealed: hex::encode(sealed),
        created_at: identity.created_at().to_rfc3339(),
    })
}

fn unseal_identity(key: &[u8; 32], record: &StoredIdentity) -> Result<Identity, KeyringError> {
    let nonce: [u8; NONCE_BYTES] = decode_fixed("identity nonce", &record.nonce)?;
    let sealed = hex::decode(&record.sealed)
        .map_err(|_| KeyringError::CorruptRecord("sealed identity is not hex"))?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let secret = Zeroizing::new(
        cipher
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &sealed,
                    aad: IDENTITY_AAD,
                },
            )
            .map_err(|_| KeyringError::CorruptRecord("identity failed authentication"))?,
    );

    let created_at = DateTime::parse_from_rfc3339(&record.created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| KeyringError::CorruptRecord("invalid creation timestamp"))?;

    Identity::from_secret_bytes(&secret, created_at)
        .ok_or(KeyringError::CorruptRecord("identity secret has wrong length"))
}

fn decode_fixed<const N: usize>(what: &str, text: &str) -> Result<[u8; N], KeyringError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(text, &mut out)
        .map_err(|_| KeyringError::Storage(format!("invalid {what} encoding")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keyring_path(dir: &TempDir) -> PathBuf {
        dir.path().join("serval.keyring")
    }

    #[test]
    fn test_open_or_create_seeds_identity() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);

        let keyring = Keyring::open_or_create(Some(path.as_path()), "").unwrap();

        assert_eq!(keyring.len(), 1);
        assert!(path.exists());
    }

    #[test]
    fn test_identities_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);

        let mut keyring = Keyring::open_or_create(Some(path.as_path()), "1234").unwrap();
        let second = keyring.create_identity("1234").unwrap().sid();
        let sids: Vec<Sid> = keyring.identities().map(Identity::sid).collect();
        drop(keyring);

        let reopened = Keyring::open_or_create(Some(path.as_path()), "1234").unwrap();
        let reopened_sids: Vec<Sid> = reopened.identities().map(Identity::sid).collect();

        assert_eq!(sids.len(), 2);
        assert_eq!(reopened_sids, sids);
        assert!(reopened.lookup(&second).is_some());
    }

    #[test]
    fn test_signing_keys_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);

        let keyring = Keyring::open_or_create(Some(path.as_path()), "").unwrap();
        let sid = keyring.identities().next().unwrap().sid();
        let (_, public) = keyring.extract_signing_key(&sid).unwrap();
        drop(keyring);

        let reopened = Keyring::open_or_create(Some(path.as_path()), "").unwrap();
        let (_, reopened_public) = reopened.extract_signing_key(&sid).unwrap();
        assert_eq!(public, reopened_public);
    }

    #[test]
    fn test_wrong_pin_sees_no_identities() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let sid = Keyring::open_or_create(Some(path.as_path()), "right")
            .unwrap()
            .identities()
            .next()
            .unwrap()
            .sid();

        let mut keyring = Keyring::open(&path).unwrap();
        assert_eq!(keyring.unlock("wrong").unwrap(), 0);
        assert!(keyring.lookup(&sid).is_none());

        assert_eq!(keyring.unlock("right").unwrap(), 1);
        assert!(keyring.lookup(&sid).is_some());
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        Keyring::open_or_create(Some(path.as_path()), "pin").unwrap();

        let mut keyring = Keyring::open(&path).unwrap();
        keyring.unlock("pin").unwrap();
        keyring.unlock("pin").unwrap();

        assert_eq!(keyring.len(), 1);
        assert_eq!(keyring.contexts.len(), 1);
    }

    #[test]
    fn test_keyring_file_has_no_plain_secrets() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let keyring = Keyring::open_or_create(Some(path.as_path()), "").unwrap();
        let identity = keyring.identities().next().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains(&identity.sid().to_hex()));
        assert!(!contents.contains(&hex::encode(&identity.signing_keypair_bytes()[..32])));
    }

    #[test]
    fn test_keyring_full() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let mut keyring = Keyring::open(&path).unwrap();

        for _ in 0..MAX_IDENTITIES_PER_CONTEXT {
            keyring.create_identity("").unwrap();
        }

        assert!(matches!(keyring.create_identity(""), Err(KeyringError::Full)));
        assert_eq!(keyring.len(), MAX_IDENTITIES_PER_CONTEXT);
    }

    #[test]
    fn test_commit_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        Keyring::open_or_create(Some(path.as_path()), "").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("serval.keyring")]);
    }

    #[test]
    fn test_failed_commit_discards_new_identity() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let mut keyring = Keyring::open(blocker.join("serval.keyring")).unwrap();

        assert!(keyring.create_identity("").is_err());
        assert_eq!(keyring.len(), 0);
        assert!(keyring.identities().next().is_none());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let mut keyring = Keyring::open_or_create(Some(path.as_path()), "").unwrap();
        let existing = keyring.identities().next().unwrap().sid();

        // A non-empty directory in place of the file makes the rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), b"x").unwrap();

        assert!(keyring.create_identity("").is_err());
        assert_eq!(keyring.len(), 1);
        assert!(keyring.lookup(&existing).is_some());
        assert!(!path.with_extension("tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_keyring_file_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        Keyring::open_or_create(Some(path.as_path()), "").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_resolve_or_create() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let mut keyring = Keyring::open_or_create(Some(path.as_path()), "").unwrap();
        let existing = keyring.identities().next().unwrap().sid();

        assert_eq!(keyring.resolve_or_create(Some(&existing), "").unwrap(), existing);

        let created = keyring.resolve_or_create(None, "").unwrap();
        assert_ne!(created, existing);
        assert_eq!(keyring.len(), 2);

        let missing = Sid::from_bytes([7; 32]);
        assert!(matches!(
            keyring.resolve_or_create(Some(&missing), ""),
            Err(KeyringError::IdentityNotFound(_))
        ));
    }

    #[test]
    fn test_extract_unknown_sid() {
        let dir = TempDir::new().unwrap();
        let keyring = Keyring::open_or_create(Some(keyring_path(&dir).as_path()), "").unwrap();

        assert!(matches!(
            keyring.extract_signing_key(&Sid::from_bytes([1; 32])),
            Err(KeyringError::IdentityNotFound(_))
        ));
    }

    #[test]
    fn test_export_signing_key() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        let keyring = Keyring::open_or_create(Some(path.as_path()), "pin").unwrap();
        let identity = keyring.identities().next().unwrap().clone();
        drop(keyring);

        let exported = Keyring::export_signing_key(Some(path.as_path()), "pin", &identity.sid()).unwrap();
        assert_eq!(&exported[32..], &identity.sas_public());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(Keyring::open(&path), Err(KeyringError::Storage(_))));
    }

    #[test]
    fn test_tampered_identity_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = keyring_path(&dir);
        Keyring::open_or_create(Some(path.as_path()), "").unwrap();

        let mut file: KeyringFile =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let sealed = &mut file.contexts[0].identities[0].sealed;
        let flipped = if sealed.starts_with('0') { "1" } else { "0" };
        sealed.replace_range(0..1, flipped);
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let mut keyring = Keyring::open(&path).unwrap();
        assert!(matches!(
            keyring.unlock(""),
            Err(KeyringError::CorruptRecord(_))
        ));
    }
}
