//! Per-peer SID:SAS mapping cache.
//!
//! Each SID has its own entry behind its own mutex. A resolution attempt
//! holds that mutex from the rate-limit check to the final update, so
//! attempts for one SID are serialized while different SIDs proceed
//! independently.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;

use sas_crypto::SAS_PUBLIC_BYTES;
use sas_transport::Sid;

/// What is known about one peer's signing key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerEntry {
    sas_public: Option<[u8; SAS_PUBLIC_BYTES]>,
    valid: bool,
    last_request: Option<Instant>,
}

impl PeerEntry {
    /// The signing key, once a response has verified.
    pub fn verified_key(&self) -> Option<[u8; SAS_PUBLIC_BYTES]> {
        if self.valid {
            self.sas_public
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// When the last request for this peer was sent.
    pub fn last_request(&self) -> Option<Instant> {
        self.last_request
    }

    pub(crate) fn record_request(&mut self, at: Instant) {
        self.last_request = Some(at);
    }

    /// Store a verified key. A verified entry is never demoted.
    pub(crate) fn mark_verified(&mut self, sas_public: [u8; SAS_PUBLIC_BYTES], at: Instant) {
        self.sas_public = Some(sas_public);
        self.valid = true;
        self.last_request = Some(at);
    }
}

/// Shared SID:SAS cache. Entries are created on first use and never evicted.
#[derive(Debug, Default)]
pub struct PeerCache {
    entries: DashMap<Sid, Arc<Mutex<PeerEntry>>>,
}

impl PeerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry for `sid`, created empty if absent.
    pub fn entry(&self, sid: &Sid) -> Arc<Mutex<PeerEntry>> {
        self.entries.entry(*sid).or_default().value().clone()
    }

    /// Snapshot of the entry for `sid`, if one exists.
    pub fn get(&self, sid: &Sid) -> Option<PeerEntry> {
        self.entries.get(sid).map(|e| e.value().lock().clone())
    }

    /// The verified signing key for `sid`, if any.
    pub fn verified_key(&self, sid: &Sid) -> Option<[u8; SAS_PUBLIC_BYTES]> {
        self.get(sid).and_then(|e| e.verified_key())
    }

    /// Record a mapping learnt out of band (for example from a trusted
    /// directory) as verified.
    pub fn insert_verified(&self, sid: Sid, sas_public: [u8; SAS_PUBLIC_BYTES]) {
        self.entry(&sid).lock().mark_verified(sas_public, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
