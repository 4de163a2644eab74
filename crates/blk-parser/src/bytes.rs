//! Immutable byte buffers for hashes and scripts.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use std::sync::OnceLock;

/// An immutable, owned byte sequence compared and hashed by content.
///
/// Holds hash digests (in display byte order) and raw scripts. The content
/// fingerprint used by [`Hash`] is computed on first use and cached.
#[derive(Clone)]
pub struct ByteArray {
    bytes: Box<[u8]>,
    fingerprint: OnceLock<u64>,
}

impl ByteArray {
    /// Copy `bytes` into a new byte array.
    pub fn new(bytes: &[u8]) -> Self {
        ByteArray {
            bytes: bytes.into(),
            fingerprint: OnceLock::new(),
        }
    }

    /// An empty byte array.
    pub fn empty() -> Self {
        ByteArray::new(&[])
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether every byte is zero, e.g. the previous-block hash of the
    /// genesis block or the source hash of a coinbase input.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// A copy of the underlying bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    fn fingerprint(&self) -> u64 {
        *self.fingerprint.get_or_init(|| {
            self.bytes
                .iter()
                .fold(17u64, |acc, b| acc.wrapping_mul(23).wrapping_add(u64::from(*b)))
        })
    }
}

impl From<&[u8]> for ByteArray {
    fn from(bytes: &[u8]) -> Self {
        ByteArray::new(bytes)
    }
}

impl From<[u8; 32]> for ByteArray {
    fn from(bytes: [u8; 32]) -> Self {
        ByteArray::new(&bytes)
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(bytes: Vec<u8>) -> Self {
        ByteArray {
            bytes: bytes.into_boxed_slice(),
            fingerprint: OnceLock::new(),
        }
    }
}

impl AsRef<[u8]> for ByteArray {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for ByteArray {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ByteArray {}

impl Hash for ByteArray {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint());
    }
}

impl fmt::Display for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteArray({})", self.to_hex())
    }
}

impl FromStr for ByteArray {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s).map(ByteArray::from)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ByteArray {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
