//! SHA256 double-hashing for block and transaction identifiers.

use sha2::{Digest, Sha256};

/// Bitcoin's double SHA256: SHA256(SHA256(data)).
///
/// Block hashes are computed over the raw 80-byte header, transaction hashes
/// over the raw (non-witness) transaction bytes.
#[inline]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    result
}

/// Double SHA256 over the concatenation of several byte ranges.
///
/// Used for witness transactions, whose hash covers the serialization with
/// the marker, flag and witness stacks cut out.
pub fn double_sha256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let first = hasher.finalize();
    let second = Sha256::digest(first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    result
}

/// Reverse the byte order of a 32-byte array.
///
/// Bitcoin displays hashes in reverse byte order relative to the raw digest.
#[inline]
pub fn reverse_bytes(bytes: &[u8; 32]) -> [u8; 32] {
    let mut reversed = *bytes;
    reversed.reverse();
    reversed
}

/// Double SHA256 of `data`, in display (reversed) byte order.
pub fn display_hash(data: &[u8]) -> [u8; 32] {
    reverse_bytes(&double_sha256(data))
}
