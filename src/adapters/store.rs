//! File-backed document store: one JSON file per document.

use crate::domain::model::IssueDocument;
use crate::domain::ports::DocumentStore;
use crate::utils::error::{classify_io_error, ConnectorError, Result, StoreErrorKind};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores documents as `<base_path>/<collection>/<id>.json`.
///
/// `save` is a plain overwrite, which makes it an upsert keyed by id.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_path: PathBuf,
    collection: String,
}

impl JsonFileStore {
    pub fn new(base_path: impl Into<PathBuf>, collection: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            collection: collection.into(),
        }
    }

    fn collection_dir(&self) -> PathBuf {
        self.base_path.join(&self.collection)
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.collection_dir().join(format!("{id}.json"))
    }

    fn write_document(&self, document: &IssueDocument) -> Result<()> {
        let dir = self.collection_dir();
        fs::create_dir_all(&dir).map_err(|e| store_error(&e, &dir))?;

        let payload = serde_json::to_vec_pretty(document).map_err(|e| {
            ConnectorError::store(StoreErrorKind::InvalidDocument, e.to_string())
        })?;

        let path = self.document_path(&document.id);
        fs::write(&path, payload).map_err(|e| store_error(&e, &path))?;
        debug!(document_id = %document.id, path = %path.display(), "document written");
        Ok(())
    }
}

fn store_error(err: &std::io::Error, path: &Path) -> ConnectorError {
    ConnectorError::store(
        classify_io_error(err),
        format!("{}: {}", path.display(), err),
    )
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.document_path(id).is_file())
    }

    async fn save(&self, document: &IssueDocument) -> Result<()> {
        self.write_document(document)
    }

    async fn save_batch(&self, documents: &[IssueDocument]) -> Result<()> {
        for document in documents {
            self.write_document(document)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn document(id: &str, title: &str) -> IssueDocument {
        IssueDocument {
            id: id.to_string(),
            title: title.to_string(),
            state: "open".to_string(),
            url: format!("https://github.com/acme/widgets/issues/{id}"),
            created_at: Utc::now(),
            synced_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_then_exists_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "issues");

        assert!(!store.exists("42").await.unwrap());
        store.save(&document("42", "first")).await.unwrap();
        assert!(store.exists("42").await.unwrap());

        let raw = fs::read_to_string(dir.path().join("issues/42.json")).unwrap();
        let reread: IssueDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(reread.title, "first");
    }

    #[tokio::test]
    async fn test_save_is_an_upsert() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "issues");

        store.save(&document("42", "first")).await.unwrap();
        store.save(&document("42", "second")).await.unwrap();

        let entries = fs::read_dir(dir.path().join("issues")).unwrap().count();
        assert_eq!(entries, 1);

        let raw = fs::read_to_string(dir.path().join("issues/42.json")).unwrap();
        let reread: IssueDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(reread.title, "second");
    }

    #[tokio::test]
    async fn test_save_batch_writes_every_document() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "issues");

        store
            .save_batch(&[document("1", "a"), document("2", "b"), document("3", "c")])
            .await
            .unwrap();

        for id in ["1", "2", "3"] {
            assert!(store.exists(id).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_io_failure_surfaces_as_store_error() {
        let dir = TempDir::new().unwrap();
        // Occupy the collection path with a plain file so the directory
        // cannot be created.
        let blocker = dir.path().join("issues");
        fs::write(&blocker, b"not a directory").unwrap();

        let store = JsonFileStore::new(dir.path(), "issues");
        let err = store.save(&document("42", "first")).await.unwrap_err();

        match err {
            ConnectorError::Store { message, .. } => {
                assert!(message.contains("issues"), "{message}");
            }
            other => panic!("expected store error, got {other:?}"),
        }
    }
}
