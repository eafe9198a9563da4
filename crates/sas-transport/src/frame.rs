//! Owned mesh datagram frames.
//!
//! A received frame is an immutable value. Requests are built fresh for each
//! send instead of reusing a shared buffer.

use bytes::Bytes;

use crate::address::MdpAddress;

/// What a frame carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// Ordinary datagram.
    Data,
    /// Error reported by the local transport daemon.
    Error { code: i32, message: String },
}

/// A mesh datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    kind: FrameKind,
    source: MdpAddress,
    destination: MdpAddress,
    payload: Bytes,
}

impl Frame {
    pub fn data(source: MdpAddress, destination: MdpAddress, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Data,
            source,
            destination,
            payload: payload.into(),
        }
    }

    /// An error frame delivered to `destination` (the local socket).
    pub fn error(
        source: MdpAddress,
        destination: MdpAddress,
        code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: FrameKind::Error {
                code,
                message: message.into(),
            },
            source,
            destination,
            payload: Bytes::new(),
        }
    }

    pub fn kind(&self) -> &FrameKind {
        &self.kind
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, FrameKind::Error { .. })
    }

    pub fn source(&self) -> &MdpAddress {
        &self.source
    }

    pub fn destination(&self) -> &MdpAddress {
        &self.destination
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}
