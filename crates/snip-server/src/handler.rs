use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use snip_assign::{Assigner, UrlValidator};
use snip_crypto::{DigestAlgorithm, DigestFunction};
use snip_store::KeyValueStore;
use snip_types::UrlEncoding;

use crate::error::ApiError;

/// Shared by every request.
#[derive(Debug)]
pub struct AppState {
    pub assigner: Assigner,
    pub validator: UrlValidator,
    pub encoding: UrlEncoding,
    pub url_prefix: String,
}

impl AppState {
    /// Validate, assign and render the public short URL.
    pub async fn shorten(&self, url: &str) -> Result<String, ApiError> {
        self.validator.validate(url.as_bytes())?;
        let assignment = self.assigner.assign(url.as_bytes()).await?;
        Ok(format!(
            "{}{}",
            self.url_prefix,
            self.encoding.encode_key(&assignment.key)
        ))
    }

    /// Decode a public identifier and fetch its payload.
    pub async fn lookup(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        let key = self
            .encoding
            .decode(id)
            .map_err(|_| ApiError::UnknownId(id.to_string()))?;
        let payload = self.assigner.resolve(&key).await?;
        Ok(payload.to_vec())
    }

    fn digest(&self) -> DigestAlgorithm {
        self.assigner.digest().algorithm()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ShortenParams {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /?url=...`
pub async fn shorten_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShortenParams>,
) -> Result<String, ApiError> {
    let url = params.url.ok_or(ApiError::MissingUrl)?;
    state.shorten(&url).await
}

/// `POST /` with `url` in the form body or the query string. The body wins.
pub async fn shorten_post(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ShortenParams>,
    form: Option<Form<ShortenParams>>,
) -> Result<String, ApiError> {
    let url = form
        .and_then(|Form(body)| body.url)
        .or(query.url)
        .ok_or(ApiError::MissingUrl)?;
    state.shorten(&url).await
}

/// `GET /:id` redirects to the stored payload.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let payload = state.lookup(&id).await?;
    let location = HeaderValue::from_bytes(&payload).map_err(|_| ApiError::BadTarget)?;
    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response())
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Info handler.
pub async fn info_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "snip-server",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.assigner.store().backend().name(),
        "digest": state.digest().name(),
        "encoding": state.encoding.name(),
    }))
}
