//! Shared helpers: the blocking-task/timeout wrapper every async trait
//! method routes through, id generation, and row (de)serialization guards.

use crate::tables::{id_key, COUNTERS_TABLE, MAX_ROW_SIZE};
use forgetful_core::error::{Error, Result};
use redb::{Database, ReadableTable, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Every blocking redb operation gets this deadline; callers observe a
/// [`Error::Timeout`] rather than hanging if the database is wedged (e.g.
/// another process holds the file lock).
const DB_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a blocking redb closure on the blocking thread pool under a timeout.
///
/// # Errors
///
/// Returns [`Error::Timeout`] if `f` doesn't complete within
/// [`DB_TIMEOUT`], or [`Error::Internal`] if the worker task panics.
pub(crate) async fn with_db_timeout<F, T>(db: Arc<Database>, f: F) -> Result<T>
where
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || f(&db));
    match tokio::time::timeout(DB_TIMEOUT, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(_join_error)) => Err(Error::Internal("redb worker task panicked".to_string())),
        Err(_elapsed) => Err(Error::Timeout),
    }
}

/// Allocate the next id for `counter_key` (one of `"memory"`, `"project"`,
/// etc.), persisting the updated counter in the same write transaction as
/// the caller's row insert so a crash between the two can't skip or
/// duplicate an id.
pub(crate) fn next_id(txn: &WriteTransaction, counter_key: &str) -> Result<i64> {
    let mut table = txn.open_table(COUNTERS_TABLE).map_err(internal)?;
    let current = table.get(counter_key).map_err(internal)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(counter_key, next).map_err(internal)?;
    Ok(next as i64)
}

/// Encode a row as JSON, guarding against pathological sizes before it ever
/// reaches the table.
pub(crate) fn encode_row<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(value)?;
    if bytes.len() > MAX_ROW_SIZE {
        return Err(Error::Internal(format!(
            "row exceeds max size ({} > {MAX_ROW_SIZE} bytes)",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Decode a row previously written by [`encode_row`].
pub(crate) fn decode_row<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Scan a table and decode every value owned by `predicate`, in key order
/// (ascending id, since keys are zero-padded).
pub(crate) fn scan_all<T, F>(
    txn: &redb::ReadTransaction,
    table_def: redb::TableDefinition<&str, &[u8]>,
    predicate: F,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let table = txn.open_table(table_def).map_err(internal)?;
    let mut out = Vec::new();
    for entry in table.iter().map_err(internal)? {
        let (_key, value) = entry.map_err(internal)?;
        let row: T = decode_row(value.value())?;
        if predicate(&row) {
            out.push(row);
        }
    }
    Ok(out)
}

pub(crate) fn internal(err: impl std::fmt::Display) -> Error {
    Error::Internal(err.to_string())
}

/// Order two scored memories for ranked results: score descending, then the
/// deterministic tie-break from spec §4.D (higher `importance`, then newer
/// `created_at`, then smaller `id`).
#[must_use]
pub(crate) fn compare_scored(a: &forgetful_core::storage::ScoredMemory, b: &forgetful_core::storage::ScoredMemory) -> std::cmp::Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| b.memory.importance.cmp(&a.memory.importance))
        .then_with(|| b.memory.created_at.cmp(&a.memory.created_at))
        .then_with(|| a.memory.id.cmp(&b.memory.id))
}

#[must_use]
pub(crate) fn key_for(id: i64) -> String {
    id_key(id)
}
