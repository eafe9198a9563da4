//! SAS Core - identities, signing and SID:SAS resolution for mesh peers.
//!
//! This crate implements:
//! - The PIN-protected keyring that holds local identities
//! - Signing with a keyring identity and verification by public key
//! - Resolution of a peer's SID to its signing key (SAS) over the mesh,
//!   with a per-peer cache, rate limit and timeout
//! - The key-map responder that answers such requests for local identities

#![forbid(unsafe_code)]

// Identities and storage
pub mod identity;
pub mod keyring;

// Resolution
pub mod cache;
pub mod resolver;

// Exposed operations
pub mod api;

// Supporting modules
pub mod config;
pub mod errors;
pub mod harness;

pub use api::{
    export_signing_key, sign, sign_as, sign_with_key, verify, Session, SignOutput,
};
pub use cache::{PeerCache, PeerEntry};
pub use config::{CliOverrides, Config, ConfigError, KeyringConfig, LoggingConfig, ResolverConfig};
pub use errors::{CoreError, ErrorKind, KeyringError, ResolveError};
pub use identity::Identity;
pub use keyring::{Keyring, MAX_CONTEXTS, MAX_IDENTITIES_PER_CONTEXT};
pub use resolver::{
    build_sas_response, SasResolver, SasResponse, Shutdown, KEYTYPE_CRYPTOSIGN, SAS_RESPONSE_BYTES,
};

#[cfg(test)]
mod proptests;
