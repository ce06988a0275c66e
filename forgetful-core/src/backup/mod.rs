//! Backup/restore contract (spec §4.L).
//!
//! The embedded backend backs up by copying its database file (plus any
//! write-ahead-log sidecar files); the server backend backs up via its
//! native dump/restore tooling. Each storage crate provides its own
//! [`BackupService`] impl; this crate only defines the seam.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Identifies a completed backup for later restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupHandle {
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// Backup/restore operations a storage backend can implement.
///
/// # Errors
///
/// Implementations return [`crate::error::Error::Io`] for filesystem
/// failures and [`crate::error::Error::Internal`] for tool-invocation
/// failures (e.g. a native dump command exiting non-zero).
#[async_trait]
pub trait BackupService: Send + Sync {
    /// Create a new backup and return a handle identifying it.
    async fn create_backup(&self) -> Result<BackupHandle>;

    /// Restore from a previously created backup, replacing live data.
    ///
    /// Callers are responsible for stopping concurrent writes first; this
    /// trait does not take a lock.
    async fn restore_backup(&self, handle: &BackupHandle) -> Result<()>;
}

/// Format a backup filename stem with a sortable timestamp, matching the
/// source prototype's `%Y%m%d-%H%M%S` convention.
#[must_use]
pub fn backup_filename(prefix: &str, timestamp: DateTime<Utc>) -> String {
    format!("{prefix}.bak-{}", timestamp.format("%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filename_uses_sortable_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(backup_filename("forgetful.redb", ts), "forgetful.redb.bak-20260102-030405");
    }
}
