//! Row (de)serialization helpers shared by every domain module.

use chrono::{DateTime, Utc};
use forgetful_core::error::{Error, Result};
use libsql::Row;
use serde::{de::DeserializeOwned, Serialize};

pub(crate) fn internal(err: impl std::fmt::Display) -> Error {
    Error::Internal(err.to_string())
}

/// Encode a list/JSON-shaped value as its SQL `TEXT` column representation.
pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a value previously written by [`encode_json`].
pub(crate) fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}

/// Encode an embedding as the JSON array literal libsql's `vector32()`
/// expects, e.g. `[0.1,0.2,0.3]`.
pub(crate) fn encode_vector(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 8 + 2);
    out.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| internal(format!("invalid timestamp '{text}': {e}")))
}

pub(crate) fn row_text(row: &Row, idx: i32) -> Result<String> {
    row.get::<String>(idx).map_err(internal)
}

pub(crate) fn row_text_opt(row: &Row, idx: i32) -> Result<Option<String>> {
    row.get::<Option<String>>(idx).map_err(internal)
}

pub(crate) fn row_i64(row: &Row, idx: i32) -> Result<i64> {
    row.get::<i64>(idx).map_err(internal)
}

pub(crate) fn row_i64_opt(row: &Row, idx: i32) -> Result<Option<i64>> {
    row.get::<Option<i64>>(idx).map_err(internal)
}

pub(crate) fn row_f64_opt(row: &Row, idx: i32) -> Result<Option<f64>> {
    row.get::<Option<f64>>(idx).map_err(internal)
}

pub(crate) fn row_bool(row: &Row, idx: i32) -> Result<bool> {
    Ok(row.get::<i64>(idx).map_err(internal)? != 0)
}
