//! HTTP trigger
//!
//! `GET /` runs one ingestion and answers with the run summary;
//! `GET /health` answers `OK` without touching any downstream service.

use axum::extract::{Query, State};
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use fintrack_core::{AuthenticationError, IngestRequest, IngestService, OverallStatus};

/// Errors that end a request before any account is processed
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTHENTICATION_FAILED",
                "Authentication failed",
            ),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

fn status_code(status: OverallStatus) -> StatusCode {
    match status {
        OverallStatus::Succeeded => StatusCode::OK,
        OverallStatus::Partial => StatusCode::PARTIAL_CONTENT,
        OverallStatus::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Raw pairs so a repeated key never fails extraction; the first value wins
async fn ingest(
    State(service): State<IngestService>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let request = IngestRequest::from_query_pairs(params);
    let summary = service.handle(&request).await?;
    Ok((status_code(summary.status()), Json(summary)).into_response())
}

async fn health() -> &'static str {
    "OK"
}

/// Build the application router
pub fn router(service: IngestService) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/", get(ingest))
        .route("/health", get(health))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(service)
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
