use std::{io, net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use blobcast_types::{
    api::{ErrorResponse, HealthResponse},
    payload::{Payload, SubmitRequest},
};
use prometheus_client::{encoding::text::encode, registry::Registry};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::{error::PipelineError, pipeline::BlobSubmitter};

#[derive(Clone)]
pub struct AppState {
    submitter: Arc<BlobSubmitter>,
    registry: Arc<Registry>,
}

impl AppState {
    pub fn new(submitter: Arc<BlobSubmitter>, registry: Arc<Registry>) -> Self {
        Self { submitter, registry }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(submit))
        .route("/submit", post(submit))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[tracing::instrument(name = "http", skip_all)]
pub async fn serve(listen_addr: SocketAddr, state: AppState) -> io::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    let local_addr = listener.local_addr()?;

    info!(address = %local_addr, "Serving blob submission API");
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

async fn submit(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected malformed request body");
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Invalid request body").with_details(rejection.body_text()),
            );
        }
    };

    let result = match Payload::try_from(&request) {
        Ok(payload) => state.submitter.submit(payload).await,
        Err(e) => Err(PipelineError::from(e)),
    };

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, e.to_response())
        }
    }
}

async fn health(State(state): State<AppState>) -> Response {
    let signer = state.submitter.signer();
    match signer.resolve_address().await {
        Ok(address) => Json(HealthResponse {
            status: "ok".to_owned(),
            signer_address: address.to_string(),
            kms_key_id: signer.key_id().to_owned(),
        })
        .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Signer unavailable").with_details(e.to_string()),
        ),
    }
}

async fn metrics(State(state): State<AppState>) -> Response {
    let mut buf = String::new();
    if let Err(e) = encode(&mut buf, &state.registry) {
        error!("Failed to encode metrics: {e}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    ([(CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")], buf)
        .into_response()
}
