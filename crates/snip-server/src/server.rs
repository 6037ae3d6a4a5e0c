use std::sync::Arc;

use snip_assign::{Assigner, UrlValidator};
use snip_store::open_store;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// URL shortener server.
pub struct SnipServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl SnipServer {
    /// Open the configured store and build the assigner.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let digest = match config.secret()? {
            Some(secret) => config.digest.build_with_secret(secret),
            None => config.digest.build(),
        };
        let store = open_store(&config.store).await?;
        let assigner = Assigner::new(digest, store, config.assign.clone())?;
        let state = Arc::new(AppState {
            assigner,
            validator: UrlValidator::with_max_len(config.max_url_len),
            encoding: config.encoding,
            url_prefix: config.url_prefix.clone(),
        });
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.state))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            backend = %self.config.store.backend(),
            digest = %self.config.digest,
            "snip server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
