//! Request measure span.

use std::time::Instant;

use crate::Metrics;

/// Status label recorded when a span is dropped without a response, e.g.
/// because the client went away and the request future was cancelled.
const ABORTED: &str = "aborted";

/// Map an HTTP status code onto its class label (`2xx`, `4xx`, ...).
pub fn status_class(status: u16) -> &'static str {
  match status {
    100..=199 => "1xx",
    200..=299 => "2xx",
    300..=399 => "3xx",
    400..=499 => "4xx",
    _ => "5xx",
  }
}

/// An admitted request.
///
/// Creating the span increments the in-flight gauge. [`finish`] records the
/// request count and latency. The gauge is decremented in `Drop`, so it runs
/// on every exit path: a normal response, an unwinding panic, or a cancelled
/// future.
///
/// [`finish`]: RequestSpan::finish
#[must_use = "dropping the span immediately ends the request measurement"]
pub struct RequestSpan {
  metrics:  Metrics,
  method:   String,
  endpoint: String,
  started:  Instant,
  finished: bool,
}

impl RequestSpan {
  pub(crate) fn start(metrics: Metrics, method: &str, endpoint: &str) -> Self {
    metrics
      .requests_in_flight
      .with_label_values(&[method, endpoint])
      .inc();
    Self {
      metrics,
      method: method.to_owned(),
      endpoint: endpoint.to_owned(),
      started: Instant::now(),
      finished: false,
    }
  }

  /// Close the span with the final response status.
  pub fn finish(mut self, status: u16) {
    self.observe(status_class(status));
    self.finished = true;
  }

  fn observe(&self, status: &str) {
    let labels = [self.method.as_str(), self.endpoint.as_str()];
    self
      .metrics
      .request_duration
      .with_label_values(&labels)
      .observe(self.started.elapsed().as_secs_f64());
    self
      .metrics
      .requests_total
      .with_label_values(&[labels[0], labels[1], status])
      .inc();
  }
}

impl Drop for RequestSpan {
  fn drop(&mut self) {
    if !self.finished {
      self.observe(ABORTED);
    }
    self
      .metrics
      .requests_in_flight
      .with_label_values(&[self.method.as_str(), self.endpoint.as_str()])
      .dec();
  }
}
