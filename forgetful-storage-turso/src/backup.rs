//! [`BackupService`] for the server-class backend.
//!
//! A local libSQL file backs up the same way the embedded backend does
//! (file copy); a remote Turso database has no local file to copy, so this
//! sketch reports it as unsupported rather than faking a dump.

use crate::{Source, TursoStorage};
use async_trait::async_trait;
use chrono::Utc;
use forgetful_core::backup::{backup_filename, BackupHandle, BackupService};
use forgetful_core::error::{Error, Result};
use std::path::Path;

#[async_trait]
impl BackupService for TursoStorage {
    async fn create_backup(&self) -> Result<BackupHandle> {
        match &self.source {
            Source::Local(path) => {
                let created_at = Utc::now();
                let stem = Path::new(path).file_name().and_then(|n| n.to_str()).unwrap_or("forgetful.db");
                let dest = Path::new(path).with_file_name(backup_filename(stem, created_at));
                tokio::fs::copy(path, &dest)
                    .await
                    .map_err(|e| Error::Internal(format!("backup copy failed: {e}")))?;
                Ok(BackupHandle {
                    path: dest.to_string_lossy().into_owned(),
                    created_at,
                })
            }
            Source::Remote(url) => Err(Error::Internal(format!(
                "remote backup of {url} is not supported; use Turso's own database dump tooling"
            ))),
        }
    }

    async fn restore_backup(&self, handle: &BackupHandle) -> Result<()> {
        match &self.source {
            Source::Local(path) => tokio::fs::copy(&handle.path, path)
                .await
                .map(|_| ())
                .map_err(|e| Error::Internal(format!("restore copy failed: {e}"))),
            Source::Remote(url) => Err(Error::Internal(format!(
                "remote restore of {url} is not supported; use Turso's own database dump tooling"
            ))),
        }
    }
}
