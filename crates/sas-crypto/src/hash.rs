use sha2::{Digest, Sha512};

/// Length of a SHA-512 digest.
pub const SHA512_BYTES: usize = 64;

/// SHA-512 of `data`. Signatures are made over this digest, not the message.
pub fn sha512(data: &[u8]) -> [u8; SHA512_BYTES] {
    let mut h = Sha512::new();
    h.update(data);
    let out = h.finalize();
    let mut arr = [0u8; SHA512_BYTES];
    arr.copy_from_slice(&out);
    arr
}
