//! Handlers for `/absensi` endpoints.
//!
//! | Method   | Path            | Notes |
//! |----------|-----------------|-------|
//! | `GET`    | `/absensi`      | Optional `?page` and `?per_page` (clamped to 100) |
//! | `POST`   | `/absensi`      | Body: `{"nrp":"...","nama":"..."}`; returns 201 + record |
//! | `GET`    | `/absensi/{id}` | 404 if not found |
//! | `PUT`    | `/absensi/{id}` | Partial body; absent fields are left unchanged |
//! | `DELETE` | `/absensi/{id}` | 404 if not found, including repeat deletes |

use absensi_core::{
  page::{Page, PageRequest},
  record::{AttendanceRecord, RawAttendance},
  store::AttendanceStore,
  timestamp,
  validate::{validate_new, validate_patch},
};
use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::json;

use crate::{AppState, error::ApiError};

// ─── Views ────────────────────────────────────────────────────────────────────

/// Wire form of an [`AttendanceRecord`]. Instants are rendered in the
/// configured display zone here and nowhere else.
#[derive(Debug, Serialize)]
pub struct RecordView {
  pub id:         i64,
  pub nrp:        String,
  pub nama:       String,
  pub timestamp:  String,
  pub updated_at: String,
}

impl RecordView {
  pub fn new(record: AttendanceRecord, zone: Tz) -> Self {
    Self {
      id:         record.id,
      nrp:        record.subject_id,
      nama:       record.subject_name,
      timestamp:  timestamp::display(record.recorded_at, zone),
      updated_at: timestamp::display(record.updated_at, zone),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct PageView {
  pub total:    u64,
  pub page:     u32,
  pub per_page: u32,
  pub data:     Vec<RecordView>,
}

impl PageView {
  fn new(page: Page, zone: Tz) -> Self {
    Self {
      total:    page.total,
      page:     page.page,
      per_page: page.per_page,
      data:     page.records.into_iter().map(|r| RecordView::new(r, zone)).collect(),
    }
  }
}

fn not_found(id: i64) -> ApiError {
  ApiError::NotFound(format!("Absensi with ID {id} not found"))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /absensi[?page=<n>][&per_page=<n>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  query: Result<Query<PageRequest>, QueryRejection>,
) -> Result<Json<PageView>, ApiError>
where
  S: AttendanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Query(request) = query?;
  let page = state
    .store
    .list(request)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(PageView::new(page, state.zone)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /absensi` returns 201 + the stored record.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<RawAttendance>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AttendanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Json(raw) = body?;
  let input = validate_new(&raw)?;
  let record = state
    .store
    .create(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  tracing::info!(id = record.id, "attendance recorded");
  Ok((StatusCode::CREATED, Json(RecordView::new(record, state.zone))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /absensi/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<RecordView>, ApiError>
where
  S: AttendanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Path(id) = id?;
  let record = state
    .store
    .get(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(RecordView::new(record, state.zone)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /absensi/{id}`, body is any subset of `{"nrp":"...","nama":"..."}`.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  id: Result<Path<i64>, PathRejection>,
  body: Result<Json<RawAttendance>, JsonRejection>,
) -> Result<Json<RecordView>, ApiError>
where
  S: AttendanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Path(id) = id?;
  let Json(raw) = body?;
  let patch = validate_patch(&raw)?;
  let record = state
    .store
    .update(id, patch)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(RecordView::new(record, state.zone)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /absensi/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AttendanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Path(id) = id?;
  let removed = state
    .store
    .delete(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !removed {
    return Err(not_found(id));
  }
  tracing::info!(id, "attendance deleted");
  Ok(Json(json!({
    "message": format!("Absensi with ID {id} deleted successfully"),
    "id": id,
  })))
}
