//! Canonical day/hour keys for raw timestamps.
//!
//! Timestamps carrying an offset are converted into the target zone.
//! Timestamps without one (including bare `YYYY-MM-DD` dates) are read as
//! wall-clock time in the target zone, so `2024-05-01` and
//! `2024-05-01T00:00:00` produce the same key.

use crate::error::{AgroDashError, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HourKey {
    pub date: NaiveDate,
    pub hour: u32,
}

impl HourKey {
    /// `YYYY-MM-DD`
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl std::fmt::Display for HourKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:02}h", self.date_key(), self.hour)
    }
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

enum ParsedTimestamp {
    Instant(DateTime<FixedOffset>),
    WallClock(NaiveDateTime),
}

fn parse(raw: &str) -> Result<ParsedTimestamp> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(AgroDashError::InvalidTimestamp(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(ParsedTimestamp::Instant(dt));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(ParsedTimestamp::Instant(dt));
        }
    }
    for fmt in LOCAL_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ParsedTimestamp::WallClock(ndt));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(ParsedTimestamp::WallClock(ndt));
        }
    }

    Err(AgroDashError::InvalidTimestamp(raw.to_string()))
}

/// Resolve `raw` to its `(date, hour)` key in `tz`.
pub fn normalize_timestamp(raw: &str, tz: Tz) -> Result<HourKey> {
    match parse(raw)? {
        ParsedTimestamp::Instant(dt) => {
            let local = dt.with_timezone(&tz);
            Ok(HourKey {
                date: local.date_naive(),
                hour: local.hour(),
            })
        }
        ParsedTimestamp::WallClock(ndt) => Ok(HourKey {
            date: ndt.date(),
            hour: ndt.hour(),
        }),
    }
}

/// Resolve `raw` to an absolute instant, reading offset-less values as wall-clock time in `tz`.
///
/// Wall-clock times that fall into a DST gap are moved forward by one hour.
pub fn parse_instant(raw: &str, tz: Tz) -> Result<DateTime<Utc>> {
    match parse(raw)? {
        ParsedTimestamp::Instant(dt) => Ok(dt.with_timezone(&Utc)),
        ParsedTimestamp::WallClock(ndt) => tz
            .from_local_datetime(&ndt)
            .earliest()
            .or_else(|| {
                ndt.checked_add_signed(Duration::hours(1))
                    .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
            })
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| AgroDashError::InvalidTimestamp(raw.to_string())),
    }
}

/// Key for an optional raw timestamp, logging and skipping anything unusable.
pub fn normalize_or_skip(raw: Option<&str>, tz: Tz, context: &str) -> Option<HourKey> {
    let raw = match raw {
        Some(r) => r,
        None => {
            tracing::debug!("{}: missing timestamp, record skipped", context);
            return None;
        }
    };
    match normalize_timestamp(raw, tz) {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::debug!("{}: {}, record skipped", context, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America, Asia, UTC};

    fn key(y: i32, m: u32, d: u32, hour: u32) -> HourKey {
        HourKey {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            hour,
        }
    }

    #[test]
    fn date_only_matches_explicit_midnight() {
        let tz = Asia::Tokyo;
        let a = normalize_timestamp("2024-05-01", tz).unwrap();
        let b = normalize_timestamp("2024-05-01T00:00:00", tz).unwrap();
        let c = normalize_timestamp("2024-05-01T00:00:00+09:00", tz).unwrap();
        assert_eq!(a, key(2024, 5, 1, 0));
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.date_key(), "2024-05-01");
    }

    #[test]
    fn offset_timestamps_convert_into_zone() {
        let k = normalize_timestamp("2024-04-30T15:00:00Z", Asia::Tokyo).unwrap();
        assert_eq!(k, key(2024, 5, 1, 0));

        let k = normalize_timestamp("2024-05-01T06:30:00.000+0900", UTC).unwrap();
        assert_eq!(k, key(2024, 4, 30, 21));
    }

    #[test]
    fn short_and_space_separated_forms() {
        assert_eq!(
            normalize_timestamp("2024-05-01T13:45", UTC).unwrap(),
            key(2024, 5, 1, 13)
        );
        assert_eq!(
            normalize_timestamp("2024-05-01 07:00:00", UTC).unwrap(),
            key(2024, 5, 1, 7)
        );
    }

    #[test]
    fn invalid_inputs_fail() {
        for raw in ["", "   ", "not a date", "2024-13-01", "2024-02-30", "05/01/2024"] {
            let err = normalize_timestamp(raw, UTC).unwrap_err();
            assert!(matches!(err, AgroDashError::InvalidTimestamp(_)), "{raw}");
        }
    }

    #[test]
    fn parse_instant_uses_zone_for_wall_clock() {
        let instant = parse_instant("2024-05-01", Asia::Tokyo).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 4, 30, 15, 0, 0).unwrap());

        let instant = parse_instant("2024-05-01T00:00:00Z", Asia::Tokyo).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_instant_skips_dst_gap() {
        // 02:30 does not exist in New York on 2024-03-10
        let instant = parse_instant("2024-03-10T02:30:00", America::New_York).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap());
    }

    #[test]
    fn skip_helper_filters() {
        assert!(normalize_or_skip(None, UTC, "test").is_none());
        assert!(normalize_or_skip(Some("garbage"), UTC, "test").is_none());
        assert_eq!(
            normalize_or_skip(Some("2024-05-01T05:00:00Z"), UTC, "test"),
            Some(key(2024, 5, 1, 5))
        );
    }
}
