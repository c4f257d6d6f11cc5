use std::{path::PathBuf, time::Duration};

use absensi_store_sqlite::RetryPolicy;
use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml` and
/// `ABSENSI_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub database_path:          PathBuf,
  /// IANA zone name used when rendering timestamps.
  pub timezone:               String,
  pub connect_max_attempts:   u32,
  pub connect_retry_delay_ms: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                   "0.0.0.0".to_string(),
      port:                   5000,
      database_path:          PathBuf::from("absensi.db"),
      timezone:               "Asia/Jakarta".to_string(),
      connect_max_attempts:   5,
      connect_retry_delay_ms: 2000,
    }
  }
}

impl ServerConfig {
  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_attempts: self.connect_max_attempts,
      delay:        Duration::from_millis(self.connect_retry_delay_ms),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}
