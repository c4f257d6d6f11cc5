//! Request instrumentation.
//!
//! [`track_requests`] is installed as a route layer around every handler. It
//! admits the request into a [`RequestSpan`](absensi_metrics::RequestSpan)
//! before the handler runs and closes it after the response exists, so the
//! measured window covers body parsing, validation and every store call.
//!
//! The in-flight gauge is decremented by the span's `Drop`, which also runs
//! if the request future is cancelled. Handler panics are turned into 500
//! responses by [`CatchPanicLayer`], which sits inside this layer so a panic
//! is still counted.

use absensi_core::ErrorKind;
use absensi_metrics::Metrics;
use axum::{
  Router,
  extract::{MatchedPath, Request, State},
  middleware::{self, Next},
  response::Response,
};
use tower_http::catch_panic::CatchPanicLayer;

/// Exception `kind` label for 5xx responses that carry no [`ErrorKind`].
pub const UNHANDLED: &str = "unhandled";

/// Wrap every route of `router` with panic catching and request metrics.
///
/// Must be applied after all routes are registered: route layers only cover
/// routes that already exist.
pub fn instrument<T>(router: Router<T>, metrics: Metrics) -> Router<T>
where
  T: Clone + Send + Sync + 'static,
{
  router
    .route_layer(CatchPanicLayer::new())
    .route_layer(middleware::from_fn_with_state(metrics, track_requests))
}

pub async fn track_requests(
  State(metrics): State<Metrics>,
  req: Request,
  next: Next,
) -> Response {
  // The route template, not the raw path, keeps label cardinality bounded.
  let endpoint = req
    .extensions()
    .get::<MatchedPath>()
    .map(|p| p.as_str().to_owned())
    .unwrap_or_else(|| req.uri().path().to_owned());
  let method = req.method().clone();

  let span = metrics.start_request(method.as_str(), &endpoint);
  let response = next.run(req).await;

  let status = response.status();
  match response.extensions().get::<ErrorKind>() {
    Some(kind) => metrics.record_exception(&endpoint, kind.as_str()),
    None if status.is_server_error() => metrics.record_exception(&endpoint, UNHANDLED),
    None => {}
  }
  span.finish(status.as_u16());

  response
}
