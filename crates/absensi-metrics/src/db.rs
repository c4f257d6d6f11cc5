//! Database-operation measure span.

use std::time::Instant;

use crate::Metrics;

/// Which record store operation is being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbOperation {
  Create,
  Read,
  List,
  Update,
  Delete,
  Ping,
}

impl DbOperation {
  pub fn as_str(&self) -> &'static str {
    match self {
      DbOperation::Create => "create",
      DbOperation::Read => "read",
      DbOperation::List => "list",
      DbOperation::Update => "update",
      DbOperation::Delete => "delete",
      DbOperation::Ping => "ping",
    }
  }
}

/// How a measured operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbOutcome {
  Success,
  /// Completed without error, but the target row did not exist.
  NotFound,
  Error,
  /// The span was dropped before the operation reported back.
  Abandoned,
}

impl DbOutcome {
  pub fn as_str(&self) -> &'static str {
    match self {
      DbOutcome::Success => "success",
      DbOutcome::NotFound => "not_found",
      DbOutcome::Error => "error",
      DbOutcome::Abandoned => "abandoned",
    }
  }
}

/// Times one store operation.
///
/// Call [`finish`](DbSpan::finish) with the outcome once the transaction has
/// committed or rolled back. A span dropped unfinished is recorded as
/// [`DbOutcome::Abandoned`].
#[must_use = "an unfinished span is recorded as abandoned"]
pub struct DbSpan {
  metrics:   Metrics,
  operation: DbOperation,
  started:   Instant,
  finished:  bool,
}

impl DbSpan {
  pub(crate) fn start(metrics: Metrics, operation: DbOperation) -> Self {
    Self { metrics, operation, started: Instant::now(), finished: false }
  }

  pub fn finish(mut self, outcome: DbOutcome) {
    self.observe(outcome);
    self.finished = true;
  }

  fn observe(&self, outcome: DbOutcome) {
    let op = self.operation.as_str();
    self
      .metrics
      .db_duration
      .with_label_values(&[op])
      .observe(self.started.elapsed().as_secs_f64());
    self
      .metrics
      .db_operations
      .with_label_values(&[op, outcome.as_str()])
      .inc();
  }
}

impl Drop for DbSpan {
  fn drop(&mut self) {
    if !self.finished {
      self.observe(DbOutcome::Abandoned);
    }
  }
}
