//! Handler for `GET /metrics` (Prometheus text exposition).

use absensi_core::store::AttendanceStore;
use absensi_metrics::TEXT_CONTENT_TYPE;
use axum::{extract::State, http::header, response::IntoResponse};

use crate::{AppState, error::ApiError};

pub async fn handler<S>(State(state): State<AppState<S>>) -> Result<impl IntoResponse, ApiError>
where
  S: AttendanceStore,
{
  let body = state
    .metrics
    .render()
    .map_err(|e| ApiError::Internal(e.to_string()))?;
  Ok(([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body))
}
