//! Inbound CAP listener: a single-route axum service that authenticates,
//! parses, validates, and stores uploaded alerts.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use ravealert_cap::{parse_alert_bytes, validate_alert, ParseError, ValidationError};
use ravealert_store::{AlertStore, StoreError};
use serde::Serialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state behind the router. Cheap to clone per request.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<AlertStore>,
    /// username -> password, compared verbatim
    pub users: Arc<HashMap<String, String>>,
}

impl ApiState {
    pub fn new(store: AlertStore, users: HashMap<String, String>) -> Self {
        Self {
            store: Arc::new(store),
            users: Arc::new(users),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error("malformed CAP message: {0}")]
    Malformed(#[from] ParseError),

    #[error("alert rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Malformed(_) | ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status_code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(%status, error = %self, "upload refused");
        let body = ErrorResponse {
            status_code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status_code: u16,
    pub message: String,
}

/// Builds the listener router: `POST /` accepts a raw CAP document.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(upload_alert))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn upload_alert(
    State(state): State<ApiState>,
    auth: Option<TypedHeader<Authorization<Basic>>>,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    let auth = auth.ok_or(ApiError::Unauthorized)?;
    let known = state
        .users
        .get(auth.username())
        .ok_or(ApiError::Unauthorized)?;
    if known != auth.password() {
        return Err(ApiError::Unauthorized);
    }

    let alert = parse_alert_bytes(&body)?;
    validate_alert(&alert)?;

    // The bytes written to disk are the bytes received, not a re-serialization.
    let path = state.store.ingest(&body, &alert)?;
    info!(identifier = %alert.identifier, path = %path.display(), user = auth.username(), "alert stored");

    Ok(Json(UploadResponse {
        status_code: 200,
        message: format!("uploaded {}", alert.identifier),
    }))
}

/// Binds `addr` and serves the router until the task is cancelled.
pub async fn serve(addr: &str, state: ApiState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "CAP listener ready");
    axum::serve(listener, router(state)).await
}
