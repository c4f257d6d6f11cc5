//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error response carries its [`ErrorKind`] as a response extension.
//! The request middleware reads it back to bump the exception counter, so no
//! handler has to touch metrics itself.

use absensi_core::{ErrorKind, validate::ValidationErrors};
use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A failure outside the error taxonomy, such as metrics encoding.
  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn kind(&self) -> Option<ErrorKind> {
    match self {
      ApiError::Validation(_) => Some(ErrorKind::Validation),
      ApiError::NotFound(_) => Some(ErrorKind::NotFound),
      ApiError::Store(_) => Some(ErrorKind::Storage),
      ApiError::Internal(_) => None,
    }
  }
}

impl From<ValidationErrors> for ApiError {
  fn from(e: ValidationErrors) -> Self { ApiError::Validation(e) }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self {
    ApiError::Validation(ValidationErrors::body(r.body_text()))
  }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self {
    let mut errors = ValidationErrors::new();
    errors.add("query", r.body_text());
    ApiError::Validation(errors)
  }
}

impl From<PathRejection> for ApiError {
  fn from(_: PathRejection) -> Self {
    let mut errors = ValidationErrors::new();
    errors.add("id", "id must be an integer");
    ApiError::Validation(errors)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let mut response = match &self {
      ApiError::Validation(fields) => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "validation failed", "fields": fields })),
      )
        .into_response(),
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, source = ?e.source(), "storage operation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": self.to_string() })))
          .into_response()
      }
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": m }))).into_response()
      }
    };
    if let Some(kind) = kind {
      response.extensions_mut().insert(kind);
    }
    response
  }
}
