//! HTTP surface: the rendered page plus two small JSON endpoints.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};

use crate::catalog::CacheDocument;
use crate::error::{MirrorError, MirrorResult};
use crate::mirror::Mirror;

#[derive(Clone)]
pub struct AppState {
    mirror: Arc<Mirror>,
}

impl AppState {
    pub fn new(mirror: Arc<Mirror>) -> Self {
        Self { mirror }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<MirrorError> for ApiError {
    fn from(err: MirrorError) -> Self {
        warn!("loading catalog failed: {err}");
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Counts reported after a forced refresh.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct RefreshSummary {
    videos: usize,
    shorts: usize,
    regular: usize,
    last_update: String,
}

impl From<&CacheDocument> for RefreshSummary {
    fn from(document: &CacheDocument) -> Self {
        Self {
            videos: document.videos.len(),
            shorts: document.shorts.len(),
            regular: document.regular_videos.len(),
            last_update: document.last_update.clone(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/catalog", get(catalog))
        .route("/api/refresh", post(refresh))
        .fallback(not_found)
        .with_state(state)
}

/// Binds `host:port` and serves until Ctrl+C.
pub async fn serve(mirror: Arc<Mirror>, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("binding to {host}:{port}"))?;
    let addr = listener.local_addr().context("reading bound address")?;
    info!(channel = %mirror.channel(), "mirror listening on http://{addr}");

    axum::serve(listener, build_router(AppState::new(mirror)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running mirror server")?;
    info!("mirror server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // Without a handler the process still dies on Ctrl+C, just not gracefully.
    if let Err(err) = signal::ctrl_c().await {
        warn!("failed to install Ctrl+C handler: {err}");
    }
}

/// Runs a mirror call on the blocking pool; every upstream client is
/// synchronous.
async fn with_mirror<T, F>(state: &AppState, job: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Mirror) -> MirrorResult<T> + Send + 'static,
{
    let mirror = Arc::clone(&state.mirror);
    tokio::task::spawn_blocking(move || job(&mirror))
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?
        .map_err(ApiError::from)
}

/// The page itself answers failures in plain text rather than JSON.
async fn index(State(state): State<AppState>) -> Response {
    match with_mirror(&state, Mirror::render).await {
        Ok(page) => Html(page).into_response(),
        Err(err) => (err.status, err.message).into_response(),
    }
}

async fn catalog(State(state): State<AppState>) -> ApiResult<Json<CacheDocument>> {
    with_mirror(&state, |mirror| mirror.load(false)).await.map(Json)
}

async fn refresh(State(state): State<AppState>) -> ApiResult<Json<RefreshSummary>> {
    let document = with_mirror(&state, |mirror| mirror.load(true)).await?;
    let summary = RefreshSummary::from(&document);
    info!(
        videos = summary.videos,
        shorts = summary.shorts,
        "catalog refreshed on request"
    );
    Ok(Json(summary))
}

async fn not_found() -> ApiError {
    ApiError::not_found("endpoint not found")
}
