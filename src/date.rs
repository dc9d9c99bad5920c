//! Publish-date normalization for CNA article pages.
//!
//! CNA renders publish dates as `15 Aug 2022 02:43PM`, sometimes followed by
//! an annotation such as `(Updated: ...)`. The page carries no timezone, so
//! the wall-clock value is taken as UTC.
//!
//! Stored records were produced by a pipeline that dropped the `AM`/`PM`
//! marker instead of converting to 24-hour time. [`MeridianPolicy::Discard`]
//! keeps that behaviour so new rows line up with existing ones;
//! [`MeridianPolicy::TwentyFourHour`] converts properly.

use crate::error::DateError;
use crate::utils::normalize_text;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*\)").unwrap());
static MERIDIAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(AM|PM)").unwrap());

const FORMATS: [&str; 2] = ["%d %b %Y %H:%M", "%d %b %Y %H:%M:%S"];

/// What to do with the trailing `AM`/`PM` marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeridianPolicy {
    /// Drop the marker and keep the clock digits as-is (`02:43PM` -> `02:43`).
    #[default]
    Discard,
    /// Convert to 24-hour time (`02:43PM` -> `14:43`, `12:05AM` -> `00:05`).
    TwentyFourHour,
}

/// Parse a raw CNA date string into a UTC timestamp.
pub fn normalize_date(raw: &str, policy: MeridianPolicy) -> Result<DateTime<Utc>, DateError> {
    let without_note = ANNOTATION.replace(raw, "");
    let meridian = MERIDIAN
        .find(&without_note)
        .map(|m| m.as_str().to_ascii_uppercase());
    let stripped = normalize_text(&MERIDIAN.replace(&without_note, ""));

    let naive = FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&stripped, fmt).ok())
        .ok_or_else(|| DateError::InvalidDate(raw.to_string()))?;

    let naive = match (policy, meridian.as_deref()) {
        (MeridianPolicy::TwentyFourHour, Some(marker)) => to_twenty_four_hour(naive, marker)
            .ok_or_else(|| DateError::InvalidDate(raw.to_string()))?,
        _ => naive,
    };

    Ok(naive.and_utc())
}

/// Render a timestamp the way the store expects: millisecond ISO-8601 in UTC.
pub fn to_canonical(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse and render in one step.
pub fn canonical_date(raw: &str, policy: MeridianPolicy) -> Result<String, DateError> {
    normalize_date(raw, policy).map(|ts| to_canonical(&ts))
}

fn to_twenty_four_hour(naive: NaiveDateTime, marker: &str) -> Option<NaiveDateTime> {
    let hour = naive.hour();
    if hour == 0 || hour > 12 {
        return None;
    }
    let converted = match (marker, hour) {
        ("AM", 12) => 0,
        ("PM", h) if h < 12 => h + 12,
        (_, h) => h,
    };
    naive.with_hour(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pm_marker_is_discarded_by_default() {
        let got = canonical_date("15 Aug 2022 02:43PM", MeridianPolicy::Discard).unwrap();
        assert_eq!(got, "2022-08-15T02:43:00.000Z");
    }

    #[test]
    fn test_single_digit_day() {
        let got = canonical_date("1 Jan 2023 09:00AM", MeridianPolicy::Discard).unwrap();
        assert_eq!(got, "2023-01-01T09:00:00.000Z");
    }

    #[test]
    fn test_annotation_is_stripped() {
        let got = canonical_date(
            "15 Aug 2022 02:43PM (Updated: 16 Aug 2022 10:00AM)",
            MeridianPolicy::Discard,
        )
        .unwrap();
        assert_eq!(got, "2022-08-15T02:43:00.000Z");
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        let got = canonical_date("\n  15 Aug 2022   02:43PM \n", MeridianPolicy::Discard).unwrap();
        assert_eq!(got, "2022-08-15T02:43:00.000Z");
    }

    #[test]
    fn test_twenty_four_hour_policy() {
        let pm = canonical_date("15 Aug 2022 02:43PM", MeridianPolicy::TwentyFourHour).unwrap();
        assert_eq!(pm, "2022-08-15T14:43:00.000Z");

        let midnight = canonical_date("15 Aug 2022 12:05AM", MeridianPolicy::TwentyFourHour).unwrap();
        assert_eq!(midnight, "2022-08-15T00:05:00.000Z");

        let noon = canonical_date("15 Aug 2022 12:05PM", MeridianPolicy::TwentyFourHour).unwrap();
        assert_eq!(noon, "2022-08-15T12:05:00.000Z");

        // A marker on a clock that is already 24-hour is contradictory.
        for raw in ["15 Aug 2022 13:00PM", "15 Aug 2022 00:30AM"] {
            assert_eq!(
                normalize_date(raw, MeridianPolicy::TwentyFourHour),
                Err(DateError::InvalidDate(raw.to_string()))
            );
            assert!(normalize_date(raw, MeridianPolicy::Discard).is_ok());
        }
    }

    #[test]
    fn test_garbage_is_invalid() {
        let err = normalize_date("Published recently", MeridianPolicy::Discard).unwrap_err();
        assert_eq!(err, DateError::InvalidDate("Published recently".to_string()));
        assert!(normalize_date("", MeridianPolicy::Discard).is_err());
    }

    #[test]
    fn test_impossible_calendar_date_is_invalid() {
        assert!(normalize_date("31 Feb 2023 09:00AM", MeridianPolicy::Discard).is_err());
    }
}
