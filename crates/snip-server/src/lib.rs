//! HTTP server for snip.
//!
//! `GET /?url=...` (or a `POST` form) stores the URL and answers with its
//! short form, `GET /<id>` redirects back to it.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use handler::AppState;
pub use server::SnipServer;
