//! UTC timestamps in the `2025-01-01T12:00:00.000000Z` form used on disk.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Render format for every timestamp written by this crate.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Current UTC time, truncated to the microsecond precision stored on disk.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse an ISO-8601 instant.
///
/// Accepts RFC 3339 text with any offset, and the older offset-less form
/// (optionally ending in a bare `Z`), which is read as UTC. Sub-microsecond
/// digits are dropped to match what gets written back.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let ts = match DateTime::parse_from_rfc3339(text) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(_) => {
            let naive = text.strip_suffix('Z').unwrap_or(text);
            NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")?.and_utc()
        }
    };
    Ok(ts.trunc_subsecs(6))
}

pub(crate) fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(serde::de::Error::custom)
}
