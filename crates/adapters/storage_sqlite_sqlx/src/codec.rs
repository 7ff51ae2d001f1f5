//! Conversions between column values and domain types.

use std::str::FromStr;

use chrono::SecondsFormat;
use serde::de::DeserializeOwned;

use kanflow_domain::time::Timestamp;

pub(crate) fn decode_error<E>(err: E) -> sqlx::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    sqlx::Error::Decode(err.into())
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn encode_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.to_utc())
        .map_err(decode_error)
}

pub(crate) fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(decode_error)
}

/// Parse an enum stored through its `as_str` representation.
pub(crate) fn decode_str<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    T::from_str(raw).map_err(decode_error)
}
