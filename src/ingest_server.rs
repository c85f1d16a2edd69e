//! HTTP surface: dashboard, log retrieval and ingestion.
//!
//! | Method  | Path    | Handler      |
//! |---------|---------|--------------|
//! | OPTIONS | any     | `CorsLayer`  |
//! | GET     | `/`     | `dashboard`  |
//! | GET     | `/data` | `data`       |
//! | POST    | `/log`  | `ingest`     |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::dashboard::DASHBOARD_HTML;
use crate::errors::StoreError;

/// Permissive CORS: any origin, `POST, GET, OPTIONS`, `Content-Type`.
/// Preflight `OPTIONS` requests on any path are answered here with 200.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/data", get(data))
        .route("/log", post(ingest))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer()),
        )
        .with_state(state)
}

async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn data(State(st): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let snapshot = st.store.snapshot().map_err(|err| {
        error!(error = %err, "snapshot failed");
        AppError::from(err)
    })?;
    let body = serde_json::to_vec(snapshot.as_slice())
        .map_err(|e| AppError::internal(format!("failed to encode log: {e}")))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

async fn ingest(
    State(st): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, AppError> {
    // A body that could not be read in full is treated like a malformed one.
    let body = body.map_err(|e| {
        let err = StoreError::malformed(format!("unreadable body: {e}"));
        warn!(error = %err, "rejected telemetry record");
        AppError::from(err)
    })?;

    let store = Arc::clone(&st.store);
    let appended = tokio::task::spawn_blocking(move || store.append_raw(&body))
        .await
        .map_err(|e| AppError::internal(format!("ingest task failed: {e}")))?;

    if let Err(err) = appended {
        if err.is_client_error() {
            warn!(error = %err, "rejected telemetry record");
        }
        return Err(err.into());
    }

    Ok(Json(json!({ "status": "ok" })))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}

/// Serve `app` on `listener` until Ctrl-C.
pub async fn run_server(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

pub async fn bind(addr: &str) -> anyhow::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local = listener.local_addr()?;
    Ok((listener, local))
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
