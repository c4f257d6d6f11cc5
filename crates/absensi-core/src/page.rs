//! Offset pagination for list queries.

use serde::Deserialize;

use crate::record::AttendanceRecord;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound on `per_page`, regardless of what the caller asks for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A caller's pagination request, as it arrives in the query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
  pub page:     Option<u32>,
  pub per_page: Option<u32>,
}

impl PageRequest {
  pub fn new(page: u32, per_page: u32) -> Self {
    Self { page: Some(page), per_page: Some(per_page) }
  }

  /// 1-based page number; `0` is treated as the first page.
  pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }

  /// Page size clamped to `1..=MAX_PAGE_SIZE`.
  pub fn per_page(&self) -> u32 {
    self
      .per_page
      .unwrap_or(DEFAULT_PAGE_SIZE)
      .clamp(1, MAX_PAGE_SIZE)
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page() - 1) * u64::from(self.per_page())
  }
}

/// One page of records, most recent first, plus the total row count.
#[derive(Debug, Clone)]
pub struct Page {
  pub records:  Vec<AttendanceRecord>,
  pub total:    u64,
  pub page:     u32,
  pub per_page: u32,
}
