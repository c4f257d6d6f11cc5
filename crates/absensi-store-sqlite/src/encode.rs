//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision and a `Z` suffix, so lexical order equals chronological order.

use absensi_core::record::AttendanceRecord;
use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current instant, truncated to what the store can represent.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub const RECORD_COLUMNS: &str = "id, nrp, nama, recorded_at, updated_at";

/// An `absensi` row exactly as read from SQLite.
#[derive(Debug)]
pub struct RawRecord {
  pub id:          i64,
  pub nrp:         String,
  pub nama:        String,
  pub recorded_at: String,
  pub updated_at:  String,
}

impl RawRecord {
  /// Row mapper for queries selecting [`RECORD_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      nrp:         row.get(1)?,
      nama:        row.get(2)?,
      recorded_at: row.get(3)?,
      updated_at:  row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      id:           self.id,
      subject_id:   self.nrp,
      subject_name: self.nama,
      recorded_at:  decode_dt(&self.recorded_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}
