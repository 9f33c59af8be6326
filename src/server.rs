use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::agent::AgentRunner;
use crate::config::ServerConfig;
use crate::error::{ResearchError, Result};

pub const ROOT_MESSAGE: &str = "Gemini-Powered Research Assistant API";

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn AgentRunner>,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(agent: Arc<dyn AgentRunner>) -> Self {
        Self {
            agent,
            expose_error_details: true,
        }
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root).fallback(method_not_allowed))
        .route("/research", post(research).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "research assistant listening");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ResearchError::Io)?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: ROOT_MESSAGE,
    })
}

async fn research(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(%rejection, "rejected research request");
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text());
        }
    };

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("research", %request_id);
    let outcome = state.agent.run(&request.query).instrument(span.clone()).await;

    match outcome {
        Ok(answer) => (StatusCode::OK, Json(QueryResponse { answer })).into_response(),
        Err(err) => {
            span.in_scope(|| tracing::error!(error = %err, "research request failed"));
            let detail = if state.expose_error_details {
                err.to_string()
            } else {
                "internal server error".to_string()
            };
            error_response(StatusCode::INTERNAL_SERVER_ERROR, detail)
        }
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}
