use std::fmt;

use crate::error::TypeError;

/// Largest key width any digest produces (a full SHA-256 / BLAKE3 output).
pub const MAX_KEY_LEN: usize = 32;

/// Storage address of one payload.
///
/// A `Key` is the fixed-width digest produced by the configured digest
/// function: 6, 8 or 32 bytes depending on the algorithm. It is a plain value
/// type so it can be copied freely between the assigner, the stores and the
/// encoders. Unused trailing bytes are always zero, which keeps the derived
/// equality and hashing consistent with [`Key::as_bytes`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    bytes: [u8; MAX_KEY_LEN],
    len: u8,
}

impl Key {
    /// Build a key from raw digest bytes.
    ///
    /// Fails when `bytes` is empty or longer than [`MAX_KEY_LEN`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.is_empty() || bytes.len() > MAX_KEY_LEN {
            return Err(TypeError::InvalidKeyLength {
                max: MAX_KEY_LEN,
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; MAX_KEY_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    /// Take the first `width` bytes of a 32-byte digest.
    ///
    /// `width` is clamped to `1..=32`, digest implementations pass their
    /// fixed width so the clamp never triggers in practice.
    pub fn truncated(digest: &[u8; MAX_KEY_LEN], width: usize) -> Self {
        let width = width.clamp(1, MAX_KEY_LEN);
        let mut buf = [0u8; MAX_KEY_LEN];
        buf[..width].copy_from_slice(&digest[..width]);
        Self {
            bytes: buf,
            len: width as u8,
        }
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Key width in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` if the key holds no bytes (never for a constructed key).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hex-encoded representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidEncoding(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.to_hex())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = TypeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}
