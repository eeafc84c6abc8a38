use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::TypeError;

/// Length of an [`ImageId`] in hex characters.
pub const IMAGE_ID_HEX_LEN: usize = 64;

/// Content-addressed identifier for a stored image.
///
/// An `ImageId` is the SHA-256 hash of the blob's bytes. Identical content
/// always produces the same `ImageId`. Its lowercase hex form doubles as the
/// filename stem of the blob on disk, and it serializes as that hex string so
/// it can key a JSON object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId([u8; 32]);

impl ImageId {
    /// Hash an in-memory buffer.
    pub fn digest(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Hash everything remaining in `reader`.
    ///
    /// The reader is consumed to EOF; repositioning it is the caller's job.
    pub fn digest_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        io::copy(reader, &mut hasher)?;
        Ok(Self(hasher.finalize().into()))
    }

    /// Create an `ImageId` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Lowercase hex representation (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string. Upper case is accepted.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != IMAGE_ID_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: IMAGE_ID_HEX_LEN,
                actual: s.len(),
            });
        }
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.short_hex())
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ImageId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ImageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ImageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
