//! Error type for `absensi-store-sqlite`.

use absensi_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The database stayed unreachable for every allowed attempt.
  #[error("database unreachable after {attempts} attempt(s): {source}")]
  StartupFatal {
    attempts: u32,
    #[source]
    source:   Box<Error>,
  },
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::StartupFatal { .. } => ErrorKind::StartupFatal,
      Error::Database(_) | Error::DateParse(_) => ErrorKind::Storage,
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { Error::Database(e.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
