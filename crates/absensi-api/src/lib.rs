//! JSON REST API for the absensi service.
//!
//! Exposes an axum [`Router`] backed by any
//! [`absensi_core::store::AttendanceStore`], instrumented with the request
//! metrics from [`absensi_metrics`]. TLS and process concerns are the
//! caller's responsibility.

pub mod absensi;
pub mod error;
pub mod health;
pub mod middleware;
pub mod scrape;

use std::sync::Arc;

use absensi_core::store::AttendanceStore;
use absensi_metrics::Metrics;
use axum::{Router, routing::get};
use chrono_tz::Tz;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub metrics: Metrics,
  /// Zone used to render timestamps in responses.
  pub zone:    Tz,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      metrics: self.metrics.clone(),
      zone:    self.zone,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the fully-instrumented router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AttendanceStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let routes = Router::new()
    .route("/absensi", get(absensi::list::<S>).post(absensi::create::<S>))
    .route(
      "/absensi/{id}",
      get(absensi::get_one::<S>)
        .put(absensi::update::<S>)
        .delete(absensi::delete::<S>),
    )
    .route("/health", get(health::handler::<S>))
    .route("/metrics", get(scrape::handler::<S>));

  middleware::instrument(routes, state.metrics.clone()).with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use absensi_core::{
    page::{Page, PageRequest},
    record::{AttendancePatch, AttendanceRecord, NewAttendance},
  };
  use absensi_store_sqlite::SqliteStore;
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_state() -> AppState<SqliteStore> {
    let metrics = Metrics::new().unwrap();
    let store = SqliteStore::open_in_memory(metrics.clone()).await.unwrap();
    AppState {
      store: Arc::new(store),
      metrics,
      zone: "Asia/Jakarta".parse().unwrap(),
    }
  }

  async fn send(
    app:    Router,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn call<S>(
    state:  &AppState<S>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value)
  where
    S: AttendanceStore + 'static,
  {
    let resp = send(router(state.clone()), method, uri, body).await;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  /// `YYYY-MM-DD HH:MM:SS <ZONE>`
  fn is_display_timestamp(s: &str) -> bool {
    let Some((datetime, zone)) = s.rsplit_once(' ') else { return false };
    let digits = |r: std::ops::Range<usize>| {
      datetime.get(r).is_some_and(|p| p.chars().all(|c| c.is_ascii_digit()))
    };
    datetime.len() == 19
      && digits(0..4)
      && &datetime[4..5] == "-"
      && digits(5..7)
      && &datetime[7..8] == "-"
      && digits(8..10)
      && &datetime[10..11] == " "
      && digits(11..13)
      && &datetime[13..14] == ":"
      && digits(14..16)
      && &datetime[16..17] == ":"
      && digits(17..19)
      && !zone.is_empty()
      && zone.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-')
  }

  // ── Create ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn post_creates_record() {
    let state = make_state().await;
    let (status, body) =
      call(&state, "POST", "/absensi", Some(json!({ "nrp": "123", "nama": "Ana" }))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_i64(), "{body}");
    assert_eq!(body["nrp"], "123");
    assert_eq!(body["nama"], "Ana");
    let ts = body["timestamp"].as_str().unwrap();
    assert!(is_display_timestamp(ts), "bad timestamp: {ts}");
    assert!(ts.ends_with(" WIB"), "{ts}");
  }

  #[tokio::test]
  async fn post_missing_fields_is_rejected_without_touching_storage() {
    let state = make_state().await;
    let (status, body) = call(&state, "POST", "/absensi", Some(json!({ "nrp": "123" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["nama"][0], "nama is required");
    assert_eq!(state.metrics.exception_count("/absensi", "validation"), 1);
    assert_eq!(
      state.metrics.db_operation_count(
        absensi_metrics::DbOperation::Create,
        absensi_metrics::DbOutcome::Success
      ),
      0
    );
  }

  #[tokio::test]
  async fn post_enforces_nrp_length_boundaries() {
    let state = make_state().await;
    for (nrp, expected) in [
      (String::new(), StatusCode::BAD_REQUEST),
      ("1".repeat(21), StatusCode::BAD_REQUEST),
      ("1".to_string(), StatusCode::CREATED),
      ("1".repeat(20), StatusCode::CREATED),
    ] {
      let (status, _) =
        call(&state, "POST", "/absensi", Some(json!({ "nrp": nrp, "nama": "Ana" }))).await;
      assert_eq!(status, expected, "nrp of length {}", nrp.len());
    }
  }

  #[tokio::test]
  async fn post_malformed_json_is_a_validation_error() {
    let state = make_state().await;
    let req = Request::builder()
      .method("POST")
      .uri("/absensi")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.metrics.exception_count("/absensi", "validation"), 1);
  }

  // ── Read ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_clamps_per_page_and_orders_newest_first() {
    let state = make_state().await;
    for i in 0..3 {
      call(&state, "POST", "/absensi", Some(json!({ "nrp": i.to_string(), "nama": "N" }))).await;
      tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let (status, body) = call(&state, "GET", "/absensi?page=1&per_page=1000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["per_page"], 100);
    assert_eq!(body["page"], 1);
    assert_eq!(body["total"], 3);
    let nrps: Vec<&str> = body["data"]
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["nrp"].as_str().unwrap())
      .collect();
    assert_eq!(nrps, ["2", "1", "0"]);
  }

  #[tokio::test]
  async fn get_one_returns_record_or_404() {
    let state = make_state().await;
    let (_, created) =
      call(&state, "POST", "/absensi", Some(json!({ "nrp": "123", "nama": "Ana" }))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = call(&state, "GET", &format!("/absensi/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let (status, _) = call(&state, "GET", "/absensi/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(state.metrics.exception_count("/absensi/{id}", "not_found"), 1);
    assert_eq!(state.metrics.request_count("GET", "/absensi/{id}", "4xx"), 1);
  }

  #[tokio::test]
  async fn non_integer_id_is_a_validation_error() {
    let state = make_state().await;
    let (status, body) = call(&state, "GET", "/absensi/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["id"].is_array(), "{body}");
  }

  // ── Update ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn put_updates_only_supplied_fields() {
    let state = make_state().await;
    let (_, created) =
      call(&state, "POST", "/absensi", Some(json!({ "nrp": "123", "nama": "Ana" }))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) =
      call(&state, "PUT", &format!("/absensi/{id}"), Some(json!({ "nama": "X" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nrp"], "123");
    assert_eq!(body["nama"], "X");
    assert_eq!(body["timestamp"], created["timestamp"]);
  }

  #[tokio::test]
  async fn put_validates_present_fields() {
    let state = make_state().await;
    let (_, created) =
      call(&state, "POST", "/absensi", Some(json!({ "nrp": "123", "nama": "Ana" }))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) =
      call(&state, "PUT", &format!("/absensi/{id}"), Some(json!({ "nama": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["nama"].is_array());
  }

  #[tokio::test]
  async fn put_missing_record_is_404() {
    let state = make_state().await;
    let (status, _) =
      call(&state, "PUT", "/absensi/77", Some(json!({ "nama": "X" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Delete ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_then_get_and_delete_again_are_404() {
    let state = make_state().await;
    let (_, created) =
      call(&state, "POST", "/absensi", Some(json!({ "nrp": "123", "nama": "Ana" }))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = call(&state, "DELETE", &format!("/absensi/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, _) = call(&state, "GET", &format!("/absensi/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&state, "DELETE", &format!("/absensi/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(state.metrics.exception_count("/absensi/{id}", "storage"), 0);
  }

  // ── Storage failures ────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("disk I/O error")]
  struct DiskError;

  /// A store whose every call fails, as when the database file goes away.
  struct Broken;

  impl AttendanceStore for Broken {
    type Error = DiskError;

    async fn create(&self, _: NewAttendance) -> Result<AttendanceRecord, DiskError> {
      Err(DiskError)
    }

    async fn get(&self, _: i64) -> Result<Option<AttendanceRecord>, DiskError> {
      Err(DiskError)
    }

    async fn list(&self, _: PageRequest) -> Result<Page, DiskError> { Err(DiskError) }

    async fn update(
      &self,
      _: i64,
      _: AttendancePatch,
    ) -> Result<Option<AttendanceRecord>, DiskError> {
      Err(DiskError)
    }

    async fn delete(&self, _: i64) -> Result<bool, DiskError> { Err(DiskError) }

    async fn ping(&self) -> Result<(), DiskError> { Err(DiskError) }
  }

  fn broken_state() -> AppState<Broken> {
    AppState {
      store:   Arc::new(Broken),
      metrics: Metrics::new().unwrap(),
      zone:    "Asia/Jakarta".parse().unwrap(),
    }
  }

  fn route_of(uri: &str) -> &'static str {
    if uri == "/absensi" { "/absensi" } else { "/absensi/{id}" }
  }

  #[tokio::test]
  async fn storage_failures_are_500_and_counted() {
    let state = broken_state();
    for (method, uri, body) in [
      ("POST", "/absensi", Some(json!({ "nrp": "123", "nama": "Ana" }))),
      ("GET", "/absensi", None),
      ("GET", "/absensi/1", None),
      ("PUT", "/absensi/1", Some(json!({ "nama": "X" }))),
      ("DELETE", "/absensi/1", None),
    ] {
      let (status, resp) = call(&state, method, uri, body).await;
      assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
      assert_eq!(resp["error"], "store error: disk I/O error", "{method} {uri}");
      assert_eq!(state.metrics.in_flight(method, route_of(uri)), 0);
    }

    assert_eq!(state.metrics.exception_count("/absensi", "storage"), 2);
    assert_eq!(state.metrics.exception_count("/absensi/{id}", "storage"), 3);
    assert_eq!(state.metrics.exception_count("/absensi", middleware::UNHANDLED), 0);
    assert_eq!(state.metrics.request_count("POST", "/absensi", "5xx"), 1);
  }

  #[tokio::test]
  async fn validation_runs_before_a_failing_store() {
    let state = broken_state();
    let (status, _) = call(&state, "POST", "/absensi", Some(json!({ "nrp": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.metrics.exception_count("/absensi", "storage"), 0);
  }

  #[tokio::test]
  async fn health_reports_unhealthy_store() {
    let state = broken_state();
    let (status, body) = call(&state, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "status": "unhealthy", "error": "disk I/O error" }));
    assert_eq!(state.metrics.exception_count("/health", "storage"), 1);
    assert_eq!(state.metrics.in_flight("GET", "/health"), 0);
  }

  // ── Health / metrics ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_reports_healthy() {
    let state = make_state().await;
    let (status, body) = call(&state, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
  }

  #[tokio::test]
  async fn metrics_endpoint_exposes_request_instruments() {
    let state = make_state().await;
    call(&state, "POST", "/absensi", Some(json!({ "nrp": "1", "nama": "A" }))).await;

    let resp = send(router(state.clone()), "GET", "/metrics", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/plain"), "{ct}");

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(text.contains("http_requests_total"), "{text}");
    assert!(text.contains(r#"endpoint="/absensi""#), "{text}");
    assert!(text.contains("db_operation_duration_seconds"), "{text}");
  }

  #[tokio::test]
  async fn in_flight_settles_after_each_request() {
    let state = make_state().await;
    call(&state, "GET", "/absensi", None).await;
    call(&state, "POST", "/absensi", Some(json!({}))).await;
    assert_eq!(state.metrics.in_flight("GET", "/absensi"), 0);
    assert_eq!(state.metrics.in_flight("POST", "/absensi"), 0);
    assert_eq!(state.metrics.request_count("GET", "/absensi", "2xx"), 1);
    assert_eq!(state.metrics.request_count("POST", "/absensi", "4xx"), 1);
  }

  #[tokio::test]
  async fn in_flight_recovers_after_handler_panic() {
    async fn boom() -> StatusCode { panic!("handler failure") }

    let metrics = Metrics::new().unwrap();
    let app = middleware::instrument(
      Router::new().route("/boom", get(boom)),
      metrics.clone(),
    );

    let before = metrics.in_flight("GET", "/boom");
    let resp = send(app, "GET", "/boom", None).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(metrics.in_flight("GET", "/boom"), before);
    assert_eq!(metrics.request_count("GET", "/boom", "5xx"), 1);
    assert_eq!(metrics.exception_count("/boom", middleware::UNHANDLED), 1);
  }
}
