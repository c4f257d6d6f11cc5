//! Startup connection sequence.
//!
//! The database may come up after the service does. Before serving traffic
//! the service retries a trial connection a bounded number of times with a
//! fixed delay in between. Exhausting the attempts is fatal: the caller must
//! not go on to serve requests.

use std::{future::Future, time::Duration};

use absensi_metrics::Metrics;

use crate::{Error, Result};

/// How persistently to wait for the database at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first. `0` is treated as `1`.
  pub max_attempts: u32,
  /// Fixed pause between a failed attempt and the next one.
  pub delay:        Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 5, delay: Duration::from_secs(2) }
  }
}

/// Where the bootstrapper stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
  /// No successful connection yet; `attempts` have failed so far.
  Disconnected { attempts: u32 },
  /// A trial connection succeeded.
  Ready,
  /// Every allowed attempt failed. Terminal.
  Failed { attempts: u32 },
}

impl ConnectionState {
  pub fn on_success(self) -> Self {
    match self {
      ConnectionState::Disconnected { .. } => ConnectionState::Ready,
      other => other,
    }
  }

  pub fn on_failure(self, max_attempts: u32) -> Self {
    match self {
      ConnectionState::Disconnected { attempts } => {
        let attempts = attempts + 1;
        if attempts >= max_attempts.max(1) {
          ConnectionState::Failed { attempts }
        } else {
          ConnectionState::Disconnected { attempts }
        }
      }
      other => other,
    }
  }
}

/// Call `connect` until it succeeds or `policy` runs out of attempts.
///
/// Every attempt is counted in `db_connection_attempts_total`. On exhaustion
/// the last connection error is wrapped in [`Error::StartupFatal`].
pub async fn connect_with_retry<T, F, Fut>(
  policy: RetryPolicy,
  metrics: &Metrics,
  mut connect: F,
) -> Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let mut state = ConnectionState::Disconnected { attempts: 0 };

  loop {
    match connect().await {
      Ok(conn) => {
        metrics.record_connection_attempt(true);
        state = state.on_success();
        tracing::info!(?state, "database connection established");
        return Ok(conn);
      }
      Err(e) => {
        metrics.record_connection_attempt(false);
        state = state.on_failure(policy.max_attempts);

        if let ConnectionState::Failed { attempts } = state {
          tracing::error!(attempts, error = %e, "giving up on database connection");
          return Err(Error::StartupFatal { attempts, source: Box::new(e) });
        }

        tracing::warn!(
          ?state,
          max_attempts = policy.max_attempts,
          error = %e,
          "database not reachable, retrying in {:?}",
          policy.delay
        );
        tokio::time::sleep(policy.delay).await;
      }
    }
  }
}
