use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::error;

use super::sqlite::SqliteReservationRepository;
use super::toolcall::{self, ToolRequest};
use crate::domain::booking::{BookingService, ListReservations};

/// State shared by the handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<BookingService<SqliteReservationRepository>>,
}

impl AppState {
    pub fn new(repository: SqliteReservationRepository) -> Self {
        Self {
            service: Arc::new(BookingService::new(repository)),
        }
    }
}

/// Routes served by the booking process.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/reservations", get(reservations))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Tool-call endpoint. Per-call failures ride inside the 200 envelope; only
/// a request that does not match the envelope at all is a 400.
async fn webhook(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(value)) => serde_json::from_value::<ToolRequest>(value),
        Err(_) => return invalid_request(),
    };
    match request {
        Ok(request) => {
            let response = toolcall::dispatch(state.service.as_ref(), request).await;
            Json(response).into_response()
        }
        Err(_) => invalid_request(),
    }
}

fn invalid_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid request format" })),
    )
        .into_response()
}

/// Direct read endpoint for non-webhook consumers; structured JSON, not the
/// flattened tool-call strings.
async fn reservations(State(state): State<AppState>) -> Response {
    match state.service.list(ListReservations::default()).await {
        Ok(listing) => Json(listing).into_response(),
        Err(e) => {
            error!("listing reservations failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
