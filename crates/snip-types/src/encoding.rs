//! Textual renderings of a [`Key`] for use in URL paths and file names.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use data_encoding::Encoding;
use data_encoding_macro::new_encoding;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::key::Key;

/// Unpadded base32 over an alphabet without `I`, `O`, `0`, `1` or `8`, so
/// identifiers survive being read aloud or retyped.
const BASE32_URL: Encoding = new_encoding! {
    symbols: "ABCDEFGHJKLMNPQRSTUVWXYZ-2345679",
};

/// How a raw key is rendered as a public identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlEncoding {
    /// Unpadded base32, uppercase letters, digits and `-`. Six key bytes
    /// become ten characters.
    #[default]
    Base32,
    /// Unpadded URL-safe base64 (`A-Z a-z 0-9 - _`). Six key bytes become
    /// eight characters.
    Base64Url,
    /// Lowercase hex, two characters per key byte.
    Hex,
}

impl UrlEncoding {
    /// Render `key` and append it to `prefix`.
    ///
    /// This is the public identifier handed back to producers, e.g.
    /// `http://localhost:8080/` + `Q3ZMDJKT-W`.
    pub fn encode(&self, prefix: &[u8], key: &Key) -> Vec<u8> {
        let encoded = self.encode_key(key);
        let mut out = Vec::with_capacity(prefix.len() + encoded.len());
        out.extend_from_slice(prefix);
        out.extend_from_slice(encoded.as_bytes());
        out
    }

    /// Render `key` without any prefix.
    pub fn encode_key(&self, key: &Key) -> String {
        match self {
            Self::Base32 => BASE32_URL.encode(key.as_bytes()),
            Self::Base64Url => URL_SAFE_NO_PAD.encode(key.as_bytes()),
            Self::Hex => key.to_hex(),
        }
    }

    /// Parse an identifier produced by [`UrlEncoding::encode_key`].
    pub fn decode(&self, encoded: &str) -> Result<Key, TypeError> {
        match self {
            Self::Base32 => {
                let bytes = BASE32_URL
                    .decode(encoded.as_bytes())
                    .map_err(|e| TypeError::InvalidEncoding(e.to_string()))?;
                Key::from_slice(&bytes)
            }
            Self::Base64Url => {
                let bytes = URL_SAFE_NO_PAD
                    .decode(encoded)
                    .map_err(|e| TypeError::InvalidEncoding(e.to_string()))?;
                Key::from_slice(&bytes)
            }
            Self::Hex => Key::from_hex(encoded),
        }
    }

    /// Configuration name of this encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Base32 => "base32",
            Self::Base64Url => "base64-url",
            Self::Hex => "hex",
        }
    }
}

impl fmt::Display for UrlEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UrlEncoding {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base32" => Ok(Self::Base32),
            "base64-url" | "base64" => Ok(Self::Base64Url),
            "hex" => Ok(Self::Hex),
            other => Err(TypeError::InvalidEncoding(format!(
                "unknown encoding: {other}"
            ))),
        }
    }
}
