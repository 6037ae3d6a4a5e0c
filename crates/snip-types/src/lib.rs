//! Foundation types for snip.
//!
//! Every other snip crate depends on `snip-types`.
//!
//! # Key Types
//!
//! - [`Key`] -- fixed-width digest used as the storage address of a payload
//! - [`ErrorKind`] -- the error taxonomy shared by stores, assignment and validation
//! - [`UrlEncoding`] -- renders a key as a URL path segment and parses it back

pub mod encoding;
pub mod error;
pub mod key;

pub use encoding::UrlEncoding;
pub use error::{ErrorKind, TypeError};
pub use key::{Key, MAX_KEY_LEN};
