//! Mesh addressing: subscriber IDs and `{sid, port}` endpoints.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// Size of a subscriber ID in bytes.
pub const SID_SIZE: usize = 32;

/// Port on which peers answer SID:SAS key-map requests.
pub const KEYMAP_REQUEST_PORT: u32 = 10;

/// First port of the ephemeral range used for client requests.
pub const EPHEMERAL_PORT_BASE: u32 = 32768;

/// A 32-byte subscriber ID (SID), the public address of a mesh participant.
///
/// Displays as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sid([u8; SID_SIZE]);

/// Errors from parsing a textual or binary SID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SidParseError {
    #[error("invalid SID length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid SID encoding: not hex")]
    InvalidHex,
}

impl Sid {
    pub const fn from_bytes(bytes: [u8; SID_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, SidParseError> {
        <[u8; SID_SIZE]>::try_from(bytes)
            .map(Self)
            .map_err(|_| SidParseError::InvalidLength {
                expected: SID_SIZE,
                got: bytes.len(),
            })
    }

    pub fn as_bytes(&self) -> &[u8; SID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl FromStr for Sid {
    type Err = SidParseError;

    /// Parse exactly 64 hex characters. Upper-case input is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 2 * SID_SIZE {
            return Err(SidParseError::InvalidLength {
                expected: 2 * SID_SIZE,
                got: s.len(),
            });
        }
        let mut out = [0u8; SID_SIZE];
        hex::decode_to_slice(s, &mut out).map_err(|_| SidParseError::InvalidHex)?;
        Ok(Self(out))
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sid({}*)", self.short())
    }
}

/// A transport endpoint: subscriber plus port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MdpAddress {
    pub sid: Sid,
    pub port: u32,
}

impl MdpAddress {
    pub fn new(sid: Sid, port: u32) -> Self {
        Self { sid, port }
    }
}

impl fmt::Display for MdpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sid, self.port)
    }
}

/// Pick a random client port in `32768..65536`.
pub fn random_ephemeral_port() -> u32 {
    EPHEMERAL_PORT_BASE + rand::thread_rng().gen_range(0..EPHEMERAL_PORT_BASE)
}
