//! Identifier assignment for snip.
//!
//! [`Assigner`] turns a payload into a key by digesting it and inserting the
//! payload under that key with an insert-if-absent store. On collision it
//! appends fresh entropy to the digest input and tries again, up to a fixed
//! budget. [`UrlValidator`] screens payloads before they reach the assigner.
//!
//! The stored payload is always the caller's original bytes.

pub mod assigner;
pub mod config;
pub mod error;
pub mod validation;

pub use assigner::{Assigner, Assignment};
pub use config::AssignConfig;
pub use error::{AssignError, AssignResult, ValidationError};
pub use validation::{UrlValidator, DEFAULT_MAX_URL_LEN};
