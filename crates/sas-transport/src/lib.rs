//! Transport abstraction for the mesh datagram layer.
//!
//! This crate defines the addressing types, owned frames and the blocking
//! transport trait the SID:SAS resolver consumes, without tying them to a
//! particular daemon or socket implementation.

pub mod address;
pub mod frame;
pub mod testing;
pub mod traits;

pub use address::*;
pub use frame::*;
pub use testing::*;
pub use traits::*;
