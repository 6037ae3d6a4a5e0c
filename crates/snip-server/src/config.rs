use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use snip_assign::{AssignConfig, DEFAULT_MAX_URL_LEN};
use snip_crypto::DigestAlgorithm;
use snip_store::StoreConfig;
use snip_types::UrlEncoding;

use crate::error::{ServerError, ServerResult};

/// Everything the server needs, loadable from TOML:
///
/// ```toml
/// bind_addr = "0.0.0.0:8080"
/// url_prefix = "https://sn.ip/"
/// digest = "sha256-48"
///
/// [assign]
/// max_attempts = 50
///
/// [store]
/// backend = "redis"
/// url = "redis://127.0.0.1:6379/0"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Prepended to the encoded key in shorten responses.
    pub url_prefix: String,
    pub encoding: UrlEncoding,
    pub digest: DigestAlgorithm,
    /// Hex-encoded 32-byte secret for the keyed digests. A random one is
    /// generated at startup when unset.
    pub digest_secret: Option<String>,
    pub max_url_len: usize,
    pub assign: AssignConfig,
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            url_prefix: "http://localhost:8080/".into(),
            encoding: UrlEncoding::default(),
            digest: DigestAlgorithm::default(),
            digest_secret: None,
            max_url_len: DEFAULT_MAX_URL_LEN,
            assign: AssignConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Decode `digest_secret`, if set.
    pub fn secret(&self) -> ServerResult<Option<[u8; 32]>> {
        let Some(text) = &self.digest_secret else {
            return Ok(None);
        };
        let bytes = hex::decode(text.trim())
            .map_err(|e| ServerError::Config(format!("digest_secret: {e}")))?;
        let secret: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ServerError::Config(format!("digest_secret must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Some(secret))
    }
}
