//! Publication-date parsing and display formatting.
//!
//! Prismic reports timestamps as `2021-03-25T19:25:28+0000` (no colon in the
//! offset, so not quite RFC 3339). Dates are displayed as `25 mar 2021`: two
//! digit day, lowercase Brazilian Portuguese month abbreviation without a
//! trailing period, four digit year.

use chrono::{DateTime, Datelike, FixedOffset, ParseResult};
use serde::{de::Error as _, Deserialize, Deserializer};

/// A publication timestamp as reported by the CMS. The reported offset is
/// preserved so the displayed calendar day matches the CMS's.
pub type Timestamp = DateTime<FixedOffset>;

const MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov",
    "dez",
];

/// Parses a CMS timestamp. Both `+0000` and `+00:00` offsets are accepted.
pub fn parse(input: &str) -> ParseResult<Timestamp> {
    match DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%z") {
        Ok(timestamp) => Ok(timestamp),
        Err(_) => DateTime::parse_from_rfc3339(input),
    }
}

/// Formats a timestamp as `DD mon YYYY`.
pub fn format(timestamp: &Timestamp) -> String {
    format!(
        "{:02} {} {}",
        timestamp.day(),
        MONTHS[timestamp.month0() as usize],
        timestamp.year()
    )
}

/// Formats an optional timestamp. Absent timestamps display as the empty
/// string.
pub fn format_opt(timestamp: Option<&Timestamp>) -> String {
    timestamp.map(format).unwrap_or_default()
}

/// Deserializes a nullable CMS timestamp field.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => parse(&s).map(Some).map_err(|e| {
            D::Error::custom(format!("invalid timestamp `{}`: {}", s, e))
        }),
    }
}
