//! Prometheus instrumentation for the absensi service.
//!
//! A single [`Metrics`] value is built at process start and handed to every
//! component that records a measurement (the record store, the request
//! middleware, the bootstrapper). Cloning it is cheap; all clones share one
//! [`Registry`]. There are no global statics, so tests can build as many
//! isolated registries as they like.
//!
//! All instruments are lock-free atomics and may be updated concurrently from
//! any number of tasks.

mod db;
mod http;

pub use db::{DbOperation, DbOutcome, DbSpan};
pub use http::{RequestSpan, status_class};

use std::sync::Arc;

use prometheus::{
  Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
  TextEncoder,
};

/// Content type of [`Metrics::render`] output.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const DB_BUCKETS: &[f64] = &[
  0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// The process-wide set of instruments.
#[derive(Clone)]
pub struct Metrics {
  registry:             Arc<Registry>,
  requests_total:       IntCounterVec,
  request_duration:     HistogramVec,
  requests_in_flight:   IntGaugeVec,
  request_exceptions:   IntCounterVec,
  db_duration:          HistogramVec,
  db_operations:        IntCounterVec,
  db_connect_attempts:  IntCounterVec,
}

impl Metrics {
  /// Create every instrument and register it with a fresh registry.
  ///
  /// # Errors
  ///
  /// Returns an error if registration fails (e.g. duplicate names).
  pub fn new() -> Result<Self, prometheus::Error> {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
      Opts::new("http_requests_total", "Total HTTP requests by method, endpoint and status class"),
      &["method", "endpoint", "status"],
    )?;

    let request_duration = HistogramVec::new(
      HistogramOpts::new(
        "http_request_duration_seconds",
        "Time from request admission to response completion",
      ),
      &["method", "endpoint"],
    )?;

    let requests_in_flight = IntGaugeVec::new(
      Opts::new("http_requests_in_flight", "Requests admitted but not yet completed"),
      &["method", "endpoint"],
    )?;

    let request_exceptions = IntCounterVec::new(
      Opts::new(
        "http_request_exceptions_total",
        "Handled and unhandled request failures by endpoint and error kind",
      ),
      &["endpoint", "kind"],
    )?;

    let db_duration = HistogramVec::new(
      HistogramOpts::new(
        "db_operation_duration_seconds",
        "Latency of record store operations, transaction included",
      )
      .buckets(DB_BUCKETS.to_vec()),
      &["operation"],
    )?;

    let db_operations = IntCounterVec::new(
      Opts::new("db_operations_total", "Record store operations by kind and outcome"),
      &["operation", "outcome"],
    )?;

    let db_connect_attempts = IntCounterVec::new(
      Opts::new(
        "db_connection_attempts_total",
        "Startup database connection attempts by result",
      ),
      &["result"],
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(request_duration.clone()))?;
    registry.register(Box::new(requests_in_flight.clone()))?;
    registry.register(Box::new(request_exceptions.clone()))?;
    registry.register(Box::new(db_duration.clone()))?;
    registry.register(Box::new(db_operations.clone()))?;
    registry.register(Box::new(db_connect_attempts.clone()))?;

    Ok(Self {
      registry: Arc::new(registry),
      requests_total,
      request_duration,
      requests_in_flight,
      request_exceptions,
      db_duration,
      db_operations,
      db_connect_attempts,
    })
  }

  // ── HTTP ──────────────────────────────────────────────────────────────

  /// Admit a request: bumps the in-flight gauge and starts the latency
  /// clock. See [`RequestSpan`] for how the span is closed.
  pub fn start_request(&self, method: &str, endpoint: &str) -> RequestSpan {
    RequestSpan::start(self.clone(), method, endpoint)
  }

  /// Count a failed request under its error kind.
  pub fn record_exception(&self, endpoint: &str, kind: &str) {
    self.request_exceptions.with_label_values(&[endpoint, kind]).inc();
  }

  // ── Database ──────────────────────────────────────────────────────────

  /// Open a measure span around one store operation.
  pub fn db_span(&self, operation: DbOperation) -> DbSpan {
    DbSpan::start(self.clone(), operation)
  }

  pub fn record_connection_attempt(&self, success: bool) {
    let result = if success { "success" } else { "failure" };
    self.db_connect_attempts.with_label_values(&[result]).inc();
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub fn in_flight(&self, method: &str, endpoint: &str) -> i64 {
    self.requests_in_flight.with_label_values(&[method, endpoint]).get()
  }

  pub fn request_count(&self, method: &str, endpoint: &str, status: &str) -> u64 {
    self.requests_total.with_label_values(&[method, endpoint, status]).get()
  }

  pub fn exception_count(&self, endpoint: &str, kind: &str) -> u64 {
    self.request_exceptions.with_label_values(&[endpoint, kind]).get()
  }

  pub fn db_operation_count(&self, operation: DbOperation, outcome: DbOutcome) -> u64 {
    self
      .db_operations
      .with_label_values(&[operation.as_str(), outcome.as_str()])
      .get()
  }

  pub fn connection_attempts(&self, success: bool) -> u64 {
    let result = if success { "success" } else { "failure" };
    self.db_connect_attempts.with_label_values(&[result]).get()
  }

  /// Encode every registered family in the Prometheus text format.
  pub fn render(&self) -> Result<String, prometheus::Error> {
    let families = self.registry.gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer).map_err(|e| {
      tracing::error!(error = %e, families = families.len(), "failed to encode metrics");
      e
    })?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
  }
}
