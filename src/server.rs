//! HTTP surface over the migration orchestrator.
//!
//! Every error body has the shape `{"error": "<message>"}`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::gateway::HttpGateway;
use crate::migration::{MigrationError, MigrationOutcome, Orchestrator};
use crate::store::{Client, SqliteClientStore};

pub type MigrationService = Orchestrator<SqliteClientStore, HttpGateway>;

#[derive(Clone)]
struct AppState {
    service: Arc<MigrationService>,
}

/// Errors returned to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Client not found with id: {id}")]
    NotFound { id: i64 },

    #[error("Client with id {id} is already migrated")]
    AlreadyMigrated { id: i64 },

    #[error("Migration failed for client {id}: {detail}")]
    MigrationFailed { id: i64, detail: String },

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// - NotFound: 404
    /// - AlreadyMigrated: 400 (a rejected attempt, not a silent success)
    /// - MigrationFailed and Unexpected: 500
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyMigrated { .. } => StatusCode::BAD_REQUEST,
            Self::MigrationFailed { .. } | Self::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MigrationError> for ApiError {
    fn from(err: MigrationError) -> Self {
        Self::Unexpected(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            error!(%status, "{message}");
        } else {
            warn!(%status, "{message}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl AppState {
    async fn run_blocking<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&MigrationService) -> Result<T, MigrationError> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let result = tokio::task::spawn_blocking(move || op(service.as_ref()))
            .await
            .map_err(|err| ApiError::Unexpected(format!("store task failed: {err}")))?;
        Ok(result?)
    }
}

pub fn app(service: Arc<MigrationService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/legacy-clients", get(legacy_clients))
        .route("/api/new-clients", get(new_clients))
        .route("/api/migrate/:id", post(migrate))
        // Browser front ends are served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, service: Arc<MigrationService>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "client migrator listening");
    }
    axum::serve(listener, app(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn legacy_clients(State(state): State<AppState>) -> Result<Json<Vec<Client>>, ApiError> {
    let clients = state
        .run_blocking(|service| service.legacy_clients())
        .await?;
    Ok(Json(clients))
}

async fn new_clients(State(state): State<AppState>) -> Result<Json<Vec<Client>>, ApiError> {
    let clients = state.run_blocking(|service| service.new_clients()).await?;
    Ok(Json(clients))
}

async fn migrate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    match state.service.migrate(id).await? {
        MigrationOutcome::Succeeded => Ok(StatusCode::OK),
        MigrationOutcome::AlreadyMigrated => Err(ApiError::AlreadyMigrated { id }),
        MigrationOutcome::NotFound => Err(ApiError::NotFound { id }),
        MigrationOutcome::GatewayFailed(detail) => Err(ApiError::MigrationFailed { id, detail }),
    }
}
