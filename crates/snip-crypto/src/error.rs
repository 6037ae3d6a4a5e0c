use thiserror::Error;

/// Errors from digest configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),
}
