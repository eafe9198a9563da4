//! The mesh datagram transport consumed by the resolver.

use std::time::Duration;

use crate::address::MdpAddress;
use crate::frame::Frame;

/// Best-effort, addressed datagram delivery.
///
/// Implementations are blocking; the only call expected to wait is
/// [`MeshTransport::poll`], and it must return once `timeout` has elapsed.
pub trait MeshTransport: Send + Sync {
    /// Bind a local socket so frames addressed to `local` can be received.
    fn bind(&self, local: &MdpAddress) -> Result<(), TransportError>;

    /// Release a socket bound with [`MeshTransport::bind`].
    fn unbind(&self, _local: &MdpAddress) {}

    /// Queue a frame for delivery.
    fn send(&self, frame: &Frame) -> Result<(), TransportError>;

    /// Wait up to `timeout` for incoming frames. Returns how many are ready.
    fn poll(&self, timeout: Duration) -> usize;

    /// Take the next frame received on local `port`.
    fn recv(&self, port: u32) -> Result<Frame, TransportError>;
}

/// Transport failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport disconnected")]
    Disconnected,

    #[error("failed to bind port {port}: {reason}")]
    Bind { port: u32, reason: String },

    #[error("send failed: {0}")]
    Send(String),

    #[error("no frame pending on port {0}")]
    NothingPending(u32),

    #[error("transport daemon error #{code}: {message}")]
    Daemon { code: i32, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
