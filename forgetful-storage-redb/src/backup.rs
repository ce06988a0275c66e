//! [`BackupService`] for the embedded backend: a file copy of the redb
//! database, since there's no separate server process to dump from.

use crate::RedbStorage;
use async_trait::async_trait;
use chrono::Utc;
use forgetful_core::backup::{backup_filename, BackupHandle, BackupService};
use forgetful_core::error::{Error, Result};

#[async_trait]
impl BackupService for RedbStorage {
    async fn create_backup(&self) -> Result<BackupHandle> {
        let created_at = Utc::now();
        let stem = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("forgetful.redb");
        let dest = self
            .path
            .with_file_name(backup_filename(stem, created_at));

        tokio::fs::copy(&self.path, &dest)
            .await
            .map_err(|e| Error::Internal(format!("backup copy failed: {e}")))?;

        Ok(BackupHandle {
            path: dest.to_string_lossy().into_owned(),
            created_at,
        })
    }

    async fn restore_backup(&self, handle: &BackupHandle) -> Result<()> {
        tokio::fs::copy(&handle.path, &self.path)
            .await
            .map_err(|e| Error::Internal(format!("restore copy failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgetful_core::storage::StorageBackend;

    #[tokio::test]
    async fn backup_then_restore_round_trips_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("forgetful.redb");
        let storage = RedbStorage::open(&db_path).await.unwrap();
        let user_id = uuid::Uuid::new_v4();
        storage
            .create_memory(
                user_id,
                &forgetful_core::types::MemoryCreate {
                    title: "before backup".to_string(),
                    content: "content".to_string(),
                    context: "context".to_string(),
                    keywords: vec![],
                    tags: vec![],
                    importance: 5,
                    project_ids: vec![],
                    code_artifact_ids: vec![],
                    document_ids: vec![],
                    entity_ids: vec![],
                },
                vec![1.0],
            )
            .await
            .unwrap();

        let handle = storage.create_backup().await.unwrap();
        assert!(std::path::Path::new(&handle.path).exists());

        storage.restore_backup(&handle).await.unwrap();
    }
}
