//! Error types for `absensi-core`.

use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("unknown timezone: {0:?}")]
  UnknownTimezone(String),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Validation(_) => ErrorKind::Validation,
      Error::UnknownTimezone(_) => ErrorKind::StartupFatal,
    }
  }
}

impl From<ValidationErrors> for Error {
  fn from(e: ValidationErrors) -> Self { Error::Validation(e) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse classification of every failure the service can report.
///
/// The HTTP layer maps each kind to a status code and uses [`as_str`] as the
/// `kind` label of the exception counter.
///
/// [`as_str`]: ErrorKind::as_str
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// Bad or missing input. Never touches storage.
  Validation,
  /// The id has no persisted record.
  NotFound,
  /// Transaction or connection failure during an operation.
  Storage,
  /// The database never became reachable; the process must not serve.
  StartupFatal,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorKind::Validation => "validation",
      ErrorKind::NotFound => "not_found",
      ErrorKind::Storage => "storage",
      ErrorKind::StartupFatal => "startup_fatal",
    }
  }
}
