//! Fixed-width RFC 3339 timestamps.
//!
//! Every timestamp crossing the interchange boundary is rendered in UTC with
//! exactly three fractional digits and a `Z` suffix
//! (`2026-01-02T03:04:05.678Z`), so comparing the text compares the instants.
//! Use with `#[serde(with = "timestamp")]`, or `timestamp::option` for
//! optional fields.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Years whose rendering is fixed-width.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// Renders `ts` in the sortable interchange format.
///
/// The output is fixed-width, and so sorts chronologically, only for years
/// in [`YEAR_RANGE`]; chrono renders other years with a sign and extra
/// digits. Check with [`in_range`] before accepting user input.
#[must_use]
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether `ts` renders in the fixed-width format.
#[must_use]
pub fn in_range(ts: &DateTime<Utc>) -> bool {
    YEAR_RANGE.contains(&ts.year())
}

/// Parses any RFC 3339 timestamp and normalizes it to UTC.
///
/// # Errors
///
/// Returns a [`chrono::ParseError`] if `text` is not valid RFC 3339.
pub fn parse(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
}

/// Serde serializer for a required timestamp.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(ts))
}

/// Serde deserializer for a required timestamp.
///
/// # Errors
///
/// Fails if the value is not a string or not valid RFC 3339.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse(&text).map_err(serde::de::Error::custom)
}

/// Serde adapters for `Option<DateTime<Utc>>`.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes `Some` as the interchange string and `None` as null.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_some(&super::format(ts)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes null or an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Fails if a present value is not valid RFC 3339.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| super::parse(&text))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
