//! Digest functions for snip.
//!
//! A digest maps a payload to the fixed-width [`Key`](snip_types::Key) it is
//! stored under. All algorithms share the [`DigestFunction`] contract and are
//! selected by name through [`DigestAlgorithm`]:
//!
//! - truncated SHA-256 / BLAKE3: deterministic, identical URLs deduplicate
//! - keyed BLAKE3: deterministic per secret, resists engineered collisions
//! - random: no deduplication, uniqueness comes from the store alone
//!
//! All crypto operations wrap established libraries. There is no custom cryptography.

pub mod algorithm;
pub mod digest;
pub mod error;

pub use algorithm::DigestAlgorithm;
pub use digest::{
    Blake3Digest, DigestFunction, KeyedDigest, RandomDigest, RandomSource, Sha256Digest,
};
pub use error::CryptoError;
