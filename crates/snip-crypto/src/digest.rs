use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest as _, Sha256};
use snip_types::{Key, MAX_KEY_LEN};

use crate::algorithm::DigestAlgorithm;

/// Maps a payload to a fixed-width [`Key`].
///
/// Implementations are shared across request tasks behind an
/// `Arc<dyn DigestFunction>`, so they must be `Send + Sync` and must not
/// carry per-call mutable state. The output width is fixed for the lifetime
/// of an instance.
pub trait DigestFunction: Send + Sync {
    /// Derive a key from `input`.
    fn digest(&self, input: &[u8]) -> Key;

    /// Output width in bytes.
    fn width(&self) -> usize;

    /// The algorithm this instance implements.
    fn algorithm(&self) -> DigestAlgorithm;
}

/// SHA-256 truncated to the first `width` bytes.
///
/// Deterministic: identical payloads always map to the same key, which
/// deduplicates repeated submissions of the same URL.
#[derive(Clone, Debug)]
pub struct Sha256Digest {
    width: usize,
}

impl Sha256Digest {
    /// 48-bit keys.
    pub const W48: Self = Self { width: 6 };
    /// 64-bit keys.
    pub const W64: Self = Self { width: 8 };
    /// Full 256-bit keys.
    pub const FULL: Self = Self { width: 32 };

    /// Raw SHA-256 of `data`.
    pub fn raw_hash(data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }
}

impl DigestFunction for Sha256Digest {
    fn digest(&self, input: &[u8]) -> Key {
        Key::truncated(&Self::raw_hash(input), self.width)
    }

    fn width(&self) -> usize {
        self.width
    }

    fn algorithm(&self) -> DigestAlgorithm {
        match self.width {
            6 => DigestAlgorithm::Sha256W48,
            8 => DigestAlgorithm::Sha256W64,
            _ => DigestAlgorithm::Sha256,
        }
    }
}

/// BLAKE3 truncated to 48 bits.
#[derive(Clone, Debug)]
pub struct Blake3Digest;

impl DigestFunction for Blake3Digest {
    fn digest(&self, input: &[u8]) -> Key {
        Key::truncated(blake3::hash(input).as_bytes(), 6)
    }

    fn width(&self) -> usize {
        6
    }

    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Blake3W48
    }
}

/// Keyed BLAKE3 PRF, truncated.
///
/// Deterministic for a fixed secret but not predictable without it, so
/// outsiders cannot engineer colliding payloads.
#[derive(Clone)]
pub struct KeyedDigest {
    secret: [u8; 32],
    width: usize,
}

impl KeyedDigest {
    /// Create a keyed digest with a fresh secret from the OS RNG.
    pub fn generate(width: usize) -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self::with_secret(secret, width)
    }

    /// Create a keyed digest with a caller-supplied secret.
    ///
    /// Processes sharing one store must share the secret for identical
    /// payloads to deduplicate across them.
    pub fn with_secret(secret: [u8; 32], width: usize) -> Self {
        Self {
            secret,
            width: width.clamp(1, MAX_KEY_LEN),
        }
    }
}

impl DigestFunction for KeyedDigest {
    fn digest(&self, input: &[u8]) -> Key {
        Key::truncated(blake3::keyed_hash(&self.secret, input).as_bytes(), self.width)
    }

    fn width(&self) -> usize {
        self.width
    }

    fn algorithm(&self) -> DigestAlgorithm {
        if self.width == 8 {
            DigestAlgorithm::KeyedW64
        } else {
            DigestAlgorithm::KeyedW48
        }
    }
}

impl std::fmt::Debug for KeyedDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedDigest")
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

/// Source of randomness for [`RandomDigest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RandomSource {
    /// Operating system CSPRNG, one syscall per key.
    Os,
    /// Thread-local userspace CSPRNG seeded from the OS.
    Thread,
}

/// Ignores its input and returns random bytes.
///
/// There is no deduplication: every attempt yields an unrelated key and
/// uniqueness rests entirely on the store's duplicate detection.
#[derive(Clone, Debug)]
pub struct RandomDigest {
    source: RandomSource,
    width: usize,
}

impl RandomDigest {
    pub fn new(source: RandomSource, width: usize) -> Self {
        Self {
            source,
            width: width.clamp(1, MAX_KEY_LEN),
        }
    }
}

impl DigestFunction for RandomDigest {
    fn digest(&self, _input: &[u8]) -> Key {
        let mut buf = [0u8; MAX_KEY_LEN];
        let out = &mut buf[..self.width];
        match self.source {
            RandomSource::Os => OsRng.fill_bytes(out),
            RandomSource::Thread => rand::thread_rng().fill_bytes(out),
        }
        Key::truncated(&buf, self.width)
    }

    fn width(&self) -> usize {
        self.width
    }

    fn algorithm(&self) -> DigestAlgorithm {
        match self.source {
            RandomSource::Os => DigestAlgorithm::RandomW48,
            RandomSource::Thread => DigestAlgorithm::RandomW64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        let a = Sha256Digest::W48.digest(b"http://example.com");
        let b = Sha256Digest::W48.digest(b"http://example.com");
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
    }

    #[test]
    fn sha256_known_prefix() {
        // sha256("abc") = ba7816bf8f01cfea...
        let key = Sha256Digest::W64.digest(b"abc");
        assert_eq!(key.to_hex(), "ba7816bf8f01cfea");
    }

    #[test]
    fn sha256_widths_share_prefix() {
        let short = Sha256Digest::W48.digest(b"payload");
        let full = Sha256Digest::FULL.digest(b"payload");
        assert_eq!(full.len(), 32);
        assert_eq!(&full.as_bytes()[..6], short.as_bytes());
    }

    #[test]
    fn blake3_differs_from_sha256() {
        let a = Blake3Digest.digest(b"same");
        let b = Sha256Digest::W48.digest(b"same");
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
    }

    #[test]
    fn keyed_depends_on_secret() {
        let a = KeyedDigest::with_secret([1; 32], 6);
        let b = KeyedDigest::with_secret([2; 32], 6);
        assert_eq!(a.digest(b"x"), a.digest(b"x"));
        assert_ne!(a.digest(b"x"), b.digest(b"x"));
    }

    #[test]
    fn generated_keyed_digests_disagree() {
        let a = KeyedDigest::generate(8);
        let b = KeyedDigest::generate(8);
        assert_eq!(a.width(), 8);
        assert_ne!(a.digest(b"x"), b.digest(b"x"));
    }

    #[test]
    fn keyed_debug_hides_secret() {
        let d = KeyedDigest::with_secret([0xaa; 32], 6);
        let debug = format!("{d:?}");
        assert!(debug.contains("width"));
        assert!(!debug.contains("170"));
    }

    #[test]
    fn random_ignores_input() {
        for source in [RandomSource::Os, RandomSource::Thread] {
            let d = RandomDigest::new(source, 8);
            let a = d.digest(b"same");
            let b = d.digest(b"same");
            assert_eq!(a.len(), 8);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn algorithm_reports_width() {
        for alg in DigestAlgorithm::ALL {
            let d = alg.build();
            assert_eq!(d.algorithm(), alg);
            assert_eq!(d.width(), alg.width());
            assert_eq!(d.digest(b"input").len(), alg.width());
        }
    }
}
