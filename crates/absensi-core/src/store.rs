//! The `AttendanceStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `absensi-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  page::{Page, PageRequest},
  record::{AttendancePatch, AttendanceRecord, NewAttendance},
};

/// Abstraction over an attendance store backend.
///
/// Every method is independently atomic: it runs in its own transaction,
/// which is committed before the future resolves or rolled back on any
/// failure. No transaction is held across calls.
///
/// "Not found" is not an error. Lookups return `None` and deletes return
/// `false`; the `Err` side is reserved for storage failures.
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new record. The store assigns `id` and `recorded_at`.
  fn create(
    &self,
    input: NewAttendance,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// One page of records, most recent `recorded_at` first.
  fn list(
    &self,
    request: PageRequest,
  ) -> impl Future<Output = Result<Page, Self::Error>> + Send + '_;

  /// Merge the supplied fields into an existing record. `recorded_at` is
  /// never altered. Returns `None` if the record does not exist.
  fn update(
    &self,
    id: i64,
    patch: AttendancePatch,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Remove a record. Returns `false` if there was nothing to remove.
  fn delete(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// A trivial round-trip used by health checks.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
