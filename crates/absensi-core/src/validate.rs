//! Field validation for create and update payloads.
//!
//! Lengths are counted in characters, not bytes, so multi-byte names are not
//! penalised.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::record::{AttendancePatch, NewAttendance, RawAttendance};

pub const SUBJECT_ID_FIELD: &str = "nrp";
pub const SUBJECT_NAME_FIELD: &str = "nama";

pub const SUBJECT_ID_MAX: usize = 20;
pub const SUBJECT_NAME_MAX: usize = 100;

/// Field name → human-readable reasons, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
  pub fn new() -> Self { Self::default() }

  /// A report carrying a single reason that is not tied to one field, such
  /// as a body that is not valid JSON.
  pub fn body(reason: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.add("body", reason);
    errors
  }

  pub fn add(&mut self, field: &str, reason: impl Into<String>) {
    self.0.entry(field.to_owned()).or_default().push(reason.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }

  fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
    if self.is_empty() { Ok(value) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, reasons) in &self.0 {
      for reason in reasons {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {reason}")?;
        first = false;
      }
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

fn check_length(
  errors: &mut ValidationErrors,
  field: &str,
  value: &str,
  max: usize,
) {
  let len = value.chars().count();
  if len == 0 {
    errors.add(field, format!("{field} must not be empty"));
  } else if len > max {
    errors.add(
      field,
      format!("{field} must be at most {max} characters (got {len})"),
    );
  }
}

/// Validate a create payload. Both fields are required.
pub fn validate_new(raw: &RawAttendance) -> Result<NewAttendance, ValidationErrors> {
  let mut errors = ValidationErrors::new();

  match raw.subject_id.as_deref() {
    Some(v) => check_length(&mut errors, SUBJECT_ID_FIELD, v, SUBJECT_ID_MAX),
    None => errors.add(SUBJECT_ID_FIELD, "nrp is required"),
  }
  match raw.subject_name.as_deref() {
    Some(v) => check_length(&mut errors, SUBJECT_NAME_FIELD, v, SUBJECT_NAME_MAX),
    None => errors.add(SUBJECT_NAME_FIELD, "nama is required"),
  }

  errors.into_result(NewAttendance {
    subject_id:   raw.subject_id.clone().unwrap_or_default(),
    subject_name: raw.subject_name.clone().unwrap_or_default(),
  })
}

/// Validate an update payload. Absent fields are left alone; present fields
/// obey the same length bounds as on create.
pub fn validate_patch(raw: &RawAttendance) -> Result<AttendancePatch, ValidationErrors> {
  let mut errors = ValidationErrors::new();

  if let Some(v) = raw.subject_id.as_deref() {
    check_length(&mut errors, SUBJECT_ID_FIELD, v, SUBJECT_ID_MAX);
  }
  if let Some(v) = raw.subject_name.as_deref() {
    check_length(&mut errors, SUBJECT_NAME_FIELD, v, SUBJECT_NAME_MAX);
  }

  errors.into_result(AttendancePatch {
    subject_id:   raw.subject_id.clone(),
    subject_name: raw.subject_name.clone(),
  })
}
