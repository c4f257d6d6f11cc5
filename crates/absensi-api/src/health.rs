//! Handler for `GET /health`.
//!
//! Healthy means the store answers a trivial round-trip right now.

use absensi_core::{ErrorKind, store::AttendanceStore};
use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;

/// `GET /health`: 200 `{"status":"healthy"}` or 500 `{"status":"unhealthy","error":...}`.
pub async fn handler<S>(State(state): State<AppState<S>>) -> Response
where
  S: AttendanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  match state.store.ping().await {
    Ok(()) => (StatusCode::OK, Json(json!({ "status": "healthy" }))).into_response(),
    Err(e) => {
      tracing::error!(error = %e, "health check failed");
      let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "unhealthy", "error": e.to_string() })),
      )
        .into_response();
      response.extensions_mut().insert(ErrorKind::Storage);
      response
    }
  }
}
