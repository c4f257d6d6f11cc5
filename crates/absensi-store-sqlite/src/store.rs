//! [`SqliteStore`], the SQLite implementation of [`AttendanceStore`].
//!
//! Every operation borrows the connection for exactly one
//! [`tokio_rusqlite::Connection::call`] and runs inside a
//! [`rusqlite::Transaction`]. The transaction is committed explicitly on the
//! success path; on every other path (error, not-found early return, panic)
//! dropping it rolls back.

use std::{
  future::Future,
  path::{Path, PathBuf},
};

use absensi_core::{
  page::{Page, PageRequest},
  record::{AttendancePatch, AttendanceRecord, NewAttendance},
  store::AttendanceStore,
};
use absensi_metrics::{DbOperation, DbOutcome, Metrics};
use rusqlite::OptionalExtension as _;

use crate::{
  bootstrap::{RetryPolicy, connect_with_retry},
  encode::{RECORD_COLUMNS, RawRecord, encode_dt, now},
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An attendance store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection and the metrics handle are both
/// reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  metrics: Metrics,
}

impl SqliteStore {
  /// Connect to `path`, retrying according to `policy`, then create the
  /// schema. Fails with [`Error::StartupFatal`](crate::Error::StartupFatal)
  /// once the attempts are exhausted.
  pub async fn bootstrap(
    path: impl AsRef<Path>,
    policy: RetryPolicy,
    metrics: Metrics,
  ) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = connect_with_retry(policy, &metrics, || connect(path.clone())).await?;
    let store = Self { conn, metrics };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory(metrics: Metrics) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, metrics };
    store.init_schema().await?;
    Ok(store)
  }

  pub(crate) async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Open `path` and prove the connection works with a trial round-trip.
async fn connect(path: PathBuf) -> Result<tokio_rusqlite::Connection> {
  let conn = tokio_rusqlite::Connection::open(path).await?;
  conn
    .call(|conn| {
      conn.query_row("SELECT 1", [], |_| Ok(()))?;
      Ok(())
    })
    .await?;
  Ok(conn)
}

/// Classify a finished operation for the DB outcome counter.
fn outcome<T>(result: &Result<T>, found: impl FnOnce(&T) -> bool) -> DbOutcome {
  match result {
    Ok(v) if found(v) => DbOutcome::Success,
    Ok(_) => DbOutcome::NotFound,
    Err(_) => DbOutcome::Error,
  }
}

// ─── Transactions ────────────────────────────────────────────────────────────

impl SqliteStore {
  /// Run `op` inside a measure span for `operation`. `found` decides whether
  /// an `Ok` value counts as a hit or as not-found.
  async fn measured<T>(
    &self,
    operation: DbOperation,
    op: impl Future<Output = Result<T>>,
    found: impl FnOnce(&T) -> bool,
  ) -> Result<T> {
    let span = self.metrics.db_span(operation);
    let result = op.await;
    span.finish(outcome(&result, found));
    result
  }

  async fn insert(&self, input: NewAttendance) -> Result<AttendanceRecord> {
    let recorded_at = now();
    let at_str = encode_dt(recorded_at);
    let nrp = input.subject_id.clone();
    let nama = input.subject_name.clone();

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO absensi (nrp, nama, recorded_at, updated_at)
           VALUES (?1, ?2, ?3, ?3)",
          rusqlite::params![nrp, nama, at_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
      })
      .await?;

    Ok(AttendanceRecord {
      id,
      subject_id: input.subject_id,
      subject_name: input.subject_name,
      recorded_at,
      updated_at: recorded_at,
    })
  }

  async fn select_one(&self, id: i64) -> Result<Option<AttendanceRecord>> {
    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM absensi WHERE id = ?1"),
            rusqlite::params![id],
            RawRecord::from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  /// Count and page in one transaction so `total` and `records` agree.
  async fn select_page(&self, request: PageRequest) -> Result<Page> {
    let limit = i64::from(request.per_page());
    let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);

    let (total, raws): (i64, Vec<RawRecord>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let total: i64 = tx.query_row("SELECT COUNT(*) FROM absensi", [], |r| r.get(0))?;
        let raws = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM absensi
             ORDER BY recorded_at DESC, id DESC
             LIMIT ?1 OFFSET ?2"
          ))?;
          stmt
            .query_map(rusqlite::params![limit, offset], RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok((total, raws))
      })
      .await?;

    let records = raws
      .into_iter()
      .map(RawRecord::into_record)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page {
      records,
      total: u64::try_from(total).unwrap_or_default(),
      page: request.page(),
      per_page: request.per_page(),
    })
  }

  async fn apply_patch(
    &self,
    id: i64,
    patch: AttendancePatch,
  ) -> Result<Option<AttendanceRecord>> {
    let at_str = encode_dt(now());

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE absensi
           SET nrp        = COALESCE(?2, nrp),
               nama       = COALESCE(?3, nama),
               updated_at = ?4
           WHERE id = ?1",
          rusqlite::params![id, patch.subject_id, patch.subject_name, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {RECORD_COLUMNS} FROM absensi WHERE id = ?1"),
          rusqlite::params![id],
          RawRecord::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn remove(&self, id: i64) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM absensi WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn round_trip(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = crate::Error;

  async fn create(&self, input: NewAttendance) -> Result<AttendanceRecord> {
    self.measured(DbOperation::Create, self.insert(input), |_| true).await
  }

  async fn get(&self, id: i64) -> Result<Option<AttendanceRecord>> {
    self.measured(DbOperation::Read, self.select_one(id), Option::is_some).await
  }

  async fn list(&self, request: PageRequest) -> Result<Page> {
    self.measured(DbOperation::List, self.select_page(request), |_| true).await
  }

  async fn update(
    &self,
    id: i64,
    patch: AttendancePatch,
  ) -> Result<Option<AttendanceRecord>> {
    self
      .measured(DbOperation::Update, self.apply_patch(id, patch), Option::is_some)
      .await
  }

  async fn delete(&self, id: i64) -> Result<bool> {
    self.measured(DbOperation::Delete, self.remove(id), |removed| *removed).await
  }

  async fn ping(&self) -> Result<()> {
    self.measured(DbOperation::Ping, self.round_trip(), |_| true).await
  }
}
