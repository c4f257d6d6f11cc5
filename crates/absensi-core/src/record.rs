//! The attendance record and its write-side inputs.
//!
//! A record is either persisted (visible to reads) or absent. There is no
//! soft delete and no version history; `DELETE` is terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted attendance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  /// Store-assigned, never reused after deletion.
  pub id:           i64,
  /// The subject identifier (NRP). 1–20 characters.
  pub subject_id:   String,
  /// The subject display name. 1–100 characters.
  pub subject_name: String,
  /// Set by the store at creation; never touched by updates.
  pub recorded_at:  DateTime<Utc>,
  /// Refreshed by every successful update.
  pub updated_at:   DateTime<Utc>,
}

/// A validated create request. Obtain one through
/// [`validate_new`](crate::validate::validate_new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
  pub subject_id:   String,
  pub subject_name: String,
}

/// A validated partial update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendancePatch {
  pub subject_id:   Option<String>,
  pub subject_name: Option<String>,
}

impl AttendancePatch {
  pub fn is_empty(&self) -> bool {
    self.subject_id.is_none() && self.subject_name.is_none()
  }
}

/// Unvalidated input as it arrives on the wire.
///
/// Both fields are optional here so that a missing field surfaces as a
/// field-level validation error instead of a deserialisation failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAttendance {
  #[serde(rename = "nrp")]
  pub subject_id:   Option<String>,
  #[serde(rename = "nama")]
  pub subject_name: Option<String>,
}
