//! Persistence for connector notes.
//!
//! Notes are free-text guidance a user attaches to a connected app (for
//! example "post only in #releases" for Slack). They are held in memory and
//! written through to a JSON file so they survive restarts.
//!
//! File format: a JSON array of [`NoteRecord`], sorted by source then slug.
//! Writes go to a sibling temp file which is then renamed over the target.

use crate::context::sources::{IntegrationSource, NoteKey, NoteStore};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub source: IntegrationSource,
    pub app_slug: String,
    pub note: String,
    pub updated_at: DateTime<Utc>,
}

pub struct FileNoteStore {
    path: Option<PathBuf>,
    notes: RwLock<BTreeMap<NoteKey, NoteRecord>>,
}

impl FileNoteStore {
    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            notes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load notes from `path`. A missing file is an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let notes = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let records: Vec<NoteRecord> = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::StorageError(format!(
                        "Notes file {} is corrupt: {}",
                        path.display(),
                        e
                    ))
                })?;
                records
                    .into_iter()
                    .filter(|r| !r.note.trim().is_empty())
                    .map(|r| (NoteKey::new(r.source, &r.app_slug), r))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Notes file does not exist");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), notes = notes.len(), "Connector notes loaded");

        Ok(Self {
            path: Some(path),
            notes: RwLock::new(notes),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Every stored record, for listing.
    pub async fn records(&self) -> Vec<NoteRecord> {
        self.notes.read().await.values().cloned().collect()
    }

    async fn persist(&self, notes: &BTreeMap<NoteKey, NoteRecord>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let records: Vec<&NoteRecord> = notes.values().collect();
        let bytes = serde_json::to_vec_pretty(&records)
            .map_err(|e| AppError::StorageError(format!("Failed to encode notes: {}", e)))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        tracing::debug!(path = %path.display(), notes = records.len(), "Connector notes saved");
        Ok(())
    }
}

#[async_trait]
impl NoteStore for FileNoteStore {
    async fn all_notes(&self) -> Result<BTreeMap<NoteKey, String>> {
        Ok(self
            .notes
            .read()
            .await
            .iter()
            .map(|(key, record)| (key.clone(), record.note.clone()))
            .collect())
    }

    async fn get_note(&self, key: &NoteKey) -> Result<Option<String>> {
        Ok(self.notes.read().await.get(key).map(|r| r.note.clone()))
    }

    async fn upsert_note(&self, key: NoteKey, note: &str) -> Result<()> {
        let mut notes = self.notes.write().await;

        if note.trim().is_empty() {
            if notes.remove(&key).is_none() {
                return Ok(());
            }
        } else {
            let record = NoteRecord {
                source: key.source,
                app_slug: key.app_slug.clone(),
                note: note.trim().to_string(),
                updated_at: Utc::now(),
            };
            notes.insert(key, record);
        }

        self.persist(&notes).await
    }

    async fn delete_note(&self, key: &NoteKey) -> Result<bool> {
        let mut notes = self.notes.write().await;
        if notes.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(&notes).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn slack() -> NoteKey {
        NoteKey::new(IntegrationSource::Pipedream, "slack")
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let store = FileNoteStore::load(dir.path().join("notes.json")).await.unwrap();
        assert!(store.all_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notes_survive_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.json");

        let store = FileNoteStore::load(&path).await.unwrap();
        store.upsert_note(slack(), " Post only in #releases ").await.unwrap();
        store
            .upsert_note(NoteKey::new(IntegrationSource::Composio, "GitHub"), "Use the org account")
            .await
            .unwrap();

        let reloaded = FileNoteStore::load(&path).await.unwrap();
        assert_eq!(
            reloaded.get_note(&slack()).await.unwrap().as_deref(),
            Some("Post only in #releases")
        );
        assert_eq!(
            reloaded
                .get_note(&NoteKey::new(IntegrationSource::Composio, "github"))
                .await
                .unwrap()
                .as_deref(),
            Some("Use the org account")
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_blank_upsert_removes_note() {
        let store = FileNoteStore::in_memory();
        store.upsert_note(slack(), "keep it short").await.unwrap();
        store.upsert_note(slack(), "   ").await.unwrap();

        assert_eq!(store.get_note(&slack()).await.unwrap(), None);
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = FileNoteStore::in_memory();
        store.upsert_note(slack(), "note").await.unwrap();

        assert!(store.delete_note(&slack()).await.unwrap());
        assert!(!store.delete_note(&slack()).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = FileNoteStore::load(&path).await.err().unwrap();
        assert!(matches!(err, AppError::StorageError(_)));
    }
}
