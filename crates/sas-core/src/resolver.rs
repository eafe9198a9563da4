//! SID to SAS resolution over the mesh transport.
//!
//! To learn the signing key of a peer, the resolver sends a one-byte key-map
//! request (`KEYTYPE_CRYPTOSIGN`) to the peer's `KEYMAP_REQUEST_PORT` from a
//! fresh ephemeral port, then waits for a reply of the form
//!
//! ```text
//! keytype (1) || sas_public (32) || signature (64)
//! ```
//!
//! where `signature` is the peer's signature over its own SID under
//! `sas_public`. Only a reply from the SID that was asked, carrying a
//! signature that opens to exactly that SID, is cached.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use sas_crypto::{open_signed_block, SAS_PUBLIC_BYTES, SIGNATURE_BYTES};
use sas_transport::{
    random_ephemeral_port, Frame, FrameKind, MdpAddress, MeshTransport, Sid, TransportError,
    KEYMAP_REQUEST_PORT, SID_SIZE,
};

use crate::cache::{PeerCache, PeerEntry};
use crate::config::ResolverConfig;
use crate::errors::ResolveError;
use crate::identity::Identity;

/// Key type byte for Ed25519 signing keys.
pub const KEYTYPE_CRYPTOSIGN: u8 = 0x01;

/// Length of a complete key-map response payload.
pub const SAS_RESPONSE_BYTES: usize = 1 + SAS_PUBLIC_BYTES + SIGNATURE_BYTES;

/// Lower bound on a single transport poll.
const MIN_POLL_SLICE: Duration = Duration::from_millis(1);

/// Cooperative cancellation for blocking resolution.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A parsed key-map response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasResponse {
    pub key_type: u8,
    pub sas_public: [u8; SAS_PUBLIC_BYTES],
    pub signature: [u8; SIGNATURE_BYTES],
}

impl SasResponse {
    /// Parse a response payload to a request for `expected_key_type`.
    pub fn parse(payload: &[u8], expected_key_type: u8) -> Result<Self, ResolveError> {
        let Some(&key_type) = payload.first() else {
            return Err(ResolveError::TruncatedResponse {
                needed: SAS_RESPONSE_BYTES,
                got: 0,
            });
        };
        if key_type != expected_key_type {
            return Err(ResolveError::UnsupportedKeyType(key_type));
        }
        if payload.len() < SAS_RESPONSE_BYTES {
            return Err(ResolveError::TruncatedResponse {
                needed: SAS_RESPONSE_BYTES,
                got: payload.len(),
            });
        }

        let (sas_bytes, rest) = payload[1..].split_at(SAS_PUBLIC_BYTES);
        let mut sas_public = [0u8; SAS_PUBLIC_BYTES];
        sas_public.copy_from_slice(sas_bytes);
        let mut signature = [0u8; SIGNATURE_BYTES];
        signature.copy_from_slice(&rest[..SIGNATURE_BYTES]);

        Ok(Self {
            key_type,
            sas_public,
            signature,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SAS_RESPONSE_BYTES);
        out.push(self.key_type);
        out.extend_from_slice(&self.sas_public);
        out.extend_from_slice(&self.signature);
        out
    }

    /// Check that the signature binds `sid` to the offered key and return
    /// the key.
    pub fn verify_for(&self, sid: &Sid) -> Result<[u8; SAS_PUBLIC_BYTES], ResolveError> {
        let mut block = Vec::with_capacity(SIGNATURE_BYTES + SID_SIZE);
        block.extend_from_slice(&self.signature);
        block.extend_from_slice(sid.as_bytes());

        let plaintext = open_signed_block(&block, &self.sas_public)
            .map_err(|_| ResolveError::VerificationFailure)?;
        if plaintext.len() != SID_SIZE {
            return Err(ResolveError::ProtocolInconsistency(
                "signed mapping is not a SID",
            ));
        }
        if plaintext != sid.as_bytes() {
            return Err(ResolveError::ProtocolInconsistency(
                "signed mapping names another SID",
            ));
        }
        Ok(self.sas_public)
    }
}

/// Answer a key-map request addressed to `identity`.
///
/// Returns `None` for anything that is not a well-formed request for this
/// identity's signing key.
pub fn build_sas_response(identity: &Identity, request: &Frame) -> Option<Frame> {
    if request.is_error() {
        return None;
    }
    let destination = request.destination();
    if destination.port != KEYMAP_REQUEST_PORT || destination.sid != identity.sid() {
        return None;
    }
    if request.payload().as_ref() != &[KEYTYPE_CRYPTOSIGN][..] {
        debug!(
            requester = %request.source(),
            len = request.payload().len(),
            "Ignoring key-map request for unsupported key type"
        );
        return None;
    }

    let proof = identity.sas_proof();
    let mut signature = [0u8; SIGNATURE_BYTES];
    signature.copy_from_slice(&proof[..SIGNATURE_BYTES]);
    let response = SasResponse {
        key_type: KEYTYPE_CRYPTOSIGN,
        sas_public: identity.sas_public(),
        signature,
    };

    Some(Frame::data(
        MdpAddress::new(identity.sid(), KEYMAP_REQUEST_PORT),
        *request.source(),
        response.encode(),
    ))
}

/// Resolves peer SIDs to their signing public keys.
pub struct SasResolver<T> {
    transport: Arc<T>,
    cache: Arc<PeerCache>,
    local_sid: Sid,
    config: ResolverConfig,
}

impl<T: MeshTransport> SasResolver<T> {
    /// Create a resolver that sends requests from `local_sid`.
    pub fn new(
        transport: Arc<T>,
        cache: Arc<PeerCache>,
        local_sid: Sid,
        config: ResolverConfig,
    ) -> Self {
        Self {
            transport,
            cache,
            local_sid,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<PeerCache> {
        &self.cache
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn local_sid(&self) -> Sid {
        self.local_sid
    }

    /// Resolve `sid` to its signing public key.
    ///
    /// A verified cache entry is returned without touching the transport.
    /// Otherwise at most one request is sent, and the call blocks until a
    /// response is accepted, the request times out, or `shutdown` fires.
    pub fn resolve(
        &self,
        sid: &Sid,
        shutdown: &Shutdown,
    ) -> Result<[u8; SAS_PUBLIC_BYTES], ResolveError> {
        let slot = self.cache.entry(sid);
        let mut entry = slot.lock();

        if let Some(key) = entry.verified_key() {
            debug!(sid = %sid.short(), "SAS cache hit");
            return Ok(key);
        }

        if let Some(last) = entry.last_request() {
            let elapsed = last.elapsed();
            if elapsed < self.config.min_request_interval() {
                debug!(
                    sid = %sid.short(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "SAS request suppressed, too soon after the last one"
                );
                return Err(ResolveError::TooSoon {
                    sid: sid.to_hex(),
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
        }

        let local = MdpAddress::new(self.local_sid, random_ephemeral_port());
        self.transport.bind(&local)?;
        let result = self.exchange(&local, sid, &mut entry, shutdown);
        self.transport.unbind(&local);

        if let Err(e) = &result {
            debug!(sid = %sid.short(), error = %e, "SAS resolution failed");
        }
        result
    }

    fn exchange(
        &self,
        local: &MdpAddress,
        sid: &Sid,
        entry: &mut PeerEntry,
        shutdown: &Shutdown,
    ) -> Result<[u8; SAS_PUBLIC_BYTES], ResolveError> {
        let request = Frame::data(
            *local,
            MdpAddress::new(*sid, KEYMAP_REQUEST_PORT),
            vec![KEYTYPE_CRYPTOSIGN],
        );

        let sent = self.transport.send(&request);
        let sent_at = Instant::now();
        entry.record_request(sent_at);
        sent?;
        debug!(sid = %sid.short(), port = local.port, "Sent SAS request");

        let deadline = sent_at + self.config.request_timeout();
        let response = self.await_response(local.port, sid, deadline, shutdown)?;

        let parsed = SasResponse::parse(response.payload(), KEYTYPE_CRYPTOSIGN)?;
        let sas_public = parsed.verify_for(&response.source().sid)?;

        entry.mark_verified(sas_public, Instant::now());
        info!(
            sid = %sid.short(),
            sas = %hex::encode(sas_public),
            "Verified SID:SAS mapping"
        );
        Ok(sas_public)
    }

    /// Wait for the first data frame from `sid` on local `port`.
    fn await_response(
        &self,
        port: u32,
        sid: &Sid,
        deadline: Instant,
        shutdown: &Shutdown,
    ) -> Result<Frame, ResolveError> {
        let timeout = || ResolveError::Timeout { sid: sid.to_hex() };

        loop {
            if shutdown.is_triggered() {
                debug!(sid = %sid.short(), "SAS wait abandoned on shutdown");
                return Err(timeout());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(timeout());
            }

            let slice = (deadline - now)
                .min(self.config.poll_interval())
                .max(MIN_POLL_SLICE);
            if self.transport.poll(slice) == 0 {
                continue;
            }

            let mut drained = 0usize;
            loop {
                let frame = match self.transport.recv(port) {
                    Ok(frame) => frame,
                    Err(TransportError::NothingPending(_)) => break,
                    Err(e) => {
                        warn!(sid = %sid.short(), port, error = %e, "Receive failed while waiting for SAS");
                        break;
                    }
                };
                drained += 1;

                match frame.kind() {
                    FrameKind::Error { code, message } => {
                        warn!(sid = %sid.short(), code, message = %message, "Transport reported error while waiting for SAS");
                    }
                    FrameKind::Data if frame.source().sid != *sid => {
                        warn!(
                            expected = %sid.short(),
                            from = %frame.source().sid.short(),
                            "Ignoring SAS response from unexpected SID"
                        );
                    }
                    FrameKind::Data => return Ok(frame),
                }
            }

            // Readiness was for another socket, or recv failed.
            if drained == 0 {
                thread::sleep(slice.min(deadline.saturating_duration_since(Instant::now())));
            }
        }
    }
}
