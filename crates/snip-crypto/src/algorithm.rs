use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::digest::{
    Blake3Digest, DigestFunction, KeyedDigest, RandomDigest, RandomSource, Sha256Digest,
};
use crate::error::CryptoError;

/// Digest algorithm selected at startup.
///
/// The width of each algorithm is part of its name and never changes at
/// runtime: it fixes both the collision probability and the length of the
/// public identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-256, first 6 bytes.
    #[serde(rename = "sha256-48")]
    Sha256W48,
    /// SHA-256, first 8 bytes.
    #[serde(rename = "sha256-64")]
    Sha256W64,
    /// SHA-256, all 32 bytes.
    #[serde(rename = "sha256")]
    Sha256,
    /// BLAKE3, first 6 bytes.
    #[serde(rename = "blake3-48")]
    Blake3W48,
    /// Keyed BLAKE3 with a per-process secret, first 6 bytes.
    #[default]
    #[serde(rename = "keyed-48")]
    KeyedW48,
    /// Keyed BLAKE3 with a per-process secret, first 8 bytes.
    #[serde(rename = "keyed-64")]
    KeyedW64,
    /// 6 bytes from the OS CSPRNG.
    #[serde(rename = "random-48")]
    RandomW48,
    /// 8 bytes from the thread-local CSPRNG.
    #[serde(rename = "random-64")]
    RandomW64,
}

impl DigestAlgorithm {
    pub const ALL: [Self; 8] = [
        Self::Sha256W48,
        Self::Sha256W64,
        Self::Sha256,
        Self::Blake3W48,
        Self::KeyedW48,
        Self::KeyedW64,
        Self::RandomW48,
        Self::RandomW64,
    ];

    /// Configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256W48 => "sha256-48",
            Self::Sha256W64 => "sha256-64",
            Self::Sha256 => "sha256",
            Self::Blake3W48 => "blake3-48",
            Self::KeyedW48 => "keyed-48",
            Self::KeyedW64 => "keyed-64",
            Self::RandomW48 => "random-48",
            Self::RandomW64 => "random-64",
        }
    }

    /// Output width in bytes.
    pub fn width(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha256W64 | Self::KeyedW64 | Self::RandomW64 => 8,
            Self::Sha256W48 | Self::Blake3W48 | Self::KeyedW48 | Self::RandomW48 => 6,
        }
    }

    /// Whether identical payloads map to identical keys.
    pub fn is_content_addressed(&self) -> bool {
        !matches!(self, Self::RandomW48 | Self::RandomW64)
    }

    /// Instantiate the digest function.
    ///
    /// Keyed algorithms draw a fresh secret here, so call this once per
    /// process and share the result.
    pub fn build(&self) -> Arc<dyn DigestFunction> {
        match self {
            Self::Sha256W48 => Arc::new(Sha256Digest::W48),
            Self::Sha256W64 => Arc::new(Sha256Digest::W64),
            Self::Sha256 => Arc::new(Sha256Digest::FULL),
            Self::Blake3W48 => Arc::new(Blake3Digest),
            Self::KeyedW48 | Self::KeyedW64 => Arc::new(KeyedDigest::generate(self.width())),
            Self::RandomW48 => Arc::new(RandomDigest::new(RandomSource::Os, 6)),
            Self::RandomW64 => Arc::new(RandomDigest::new(RandomSource::Thread, 8)),
        }
    }

    /// Instantiate a keyed algorithm with an explicit secret.
    ///
    /// Non-keyed algorithms ignore the secret.
    pub fn build_with_secret(&self, secret: [u8; 32]) -> Arc<dyn DigestFunction> {
        match self {
            Self::KeyedW48 | Self::KeyedW64 => {
                Arc::new(KeyedDigest::with_secret(secret, self.width()))
            }
            _ => self.build(),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name() == s)
            .ok_or_else(|| CryptoError::UnknownAlgorithm(s.to_string()))
    }
}
