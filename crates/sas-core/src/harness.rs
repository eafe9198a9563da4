//! Test harness for SID:SAS resolution.
//!
//! Helpers to put answering peers on a test transport and to craft the
//! malformed responses a hostile or broken peer might send.

use sas_crypto::SIGNATURE_BYTES;
use sas_transport::{Frame, LoopbackMesh, MdpAddress, Sid, KEYMAP_REQUEST_PORT};

use crate::identity::Identity;
use crate::resolver::{build_sas_response, KEYTYPE_CRYPTOSIGN};

/// Register `identity` as a key-map responder on `mesh`.
pub fn serve_identity(mesh: &LoopbackMesh, identity: &Identity) {
    let identity = identity.clone();
    mesh.serve(
        MdpAddress::new(identity.sid(), KEYMAP_REQUEST_PORT),
        move |request| build_sas_response(&identity, request),
    );
}

/// A `MockTransport` responder that answers key-map requests for `identity`.
pub fn sas_responder(identity: Identity) -> impl Fn(&Frame) -> Vec<Frame> + Send + Sync + 'static {
    move |request| build_sas_response(&identity, request).into_iter().collect()
}

/// A responder that answers every request with `payload` from the SID that
/// was asked.
pub fn fixed_responder(payload: Vec<u8>) -> impl Fn(&Frame) -> Vec<Frame> + Send + Sync + 'static {
    move |request| vec![reply_to(request, request.destination().sid, payload.clone())]
}

/// A data frame answering `request` from `from` on the key-map port.
pub fn reply_to(request: &Frame, from: Sid, payload: Vec<u8>) -> Frame {
    Frame::data(
        MdpAddress::new(from, KEYMAP_REQUEST_PORT),
        *request.source(),
        payload,
    )
}

/// The well-formed response payload `identity` would send.
pub fn response_payload(identity: &Identity) -> Vec<u8> {
    let proof = identity.sas_proof();
    let mut payload = vec![KEYTYPE_CRYPTOSIGN];
    payload.extend_from_slice(&identity.sas_public());
    payload.extend_from_slice(&proof[..SIGNATURE_BYTES]);
    payload
}

/// A response payload whose mapping signature has one bit flipped.
pub fn tampered_payload(identity: &Identity) -> Vec<u8> {
    let mut payload = response_payload(identity);
    if let Some(last) = payload.last_mut() {
        *last ^= 0x01;
    }
    payload
}
