//! Conversion of stored UTC instants into the configured display zone.
//!
//! Instants are always stored in UTC. The zone only matters when a record
//! leaves the service, so this module has no state and never mutates its
//! input.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{Error, Result};

/// `YYYY-MM-DD HH:MM:SS <zone abbreviation>`.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Parse an IANA zone name such as `Asia/Jakarta`.
pub fn parse_zone(name: &str) -> Result<Tz> {
  name
    .parse::<Tz>()
    .map_err(|_| Error::UnknownTimezone(name.to_owned()))
}

/// Render `instant` in `zone`, e.g. `2024-05-01 14:03:09 WIB`.
pub fn display(instant: DateTime<Utc>, zone: Tz) -> String {
  instant.with_timezone(&zone).format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn converts_to_jakarta() {
    let zone = parse_zone("Asia/Jakarta").unwrap();
    let instant = Utc.with_ymd_and_hms(2024, 5, 1, 7, 3, 9).unwrap();
    assert_eq!(display(instant, zone), "2024-05-01 14:03:09 WIB");
  }

  #[test]
  fn crosses_date_boundary() {
    let zone = parse_zone("Asia/Jakarta").unwrap();
    let instant = Utc.with_ymd_and_hms(2023, 12, 31, 20, 0, 0).unwrap();
    assert_eq!(display(instant, zone), "2024-01-01 03:00:00 WIB");
  }

  #[test]
  fn utc_zone_is_identity() {
    let zone = parse_zone("UTC").unwrap();
    let instant = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
    assert_eq!(display(instant, zone), "2024-02-29 23:59:59 UTC");
  }

  #[test]
  fn unknown_zone_is_rejected() {
    assert!(matches!(
      parse_zone("Mars/Olympus"),
      Err(Error::UnknownTimezone(name)) if name == "Mars/Olympus"
    ));
  }
}
