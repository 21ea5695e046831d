use std::collections::BTreeMap;
use std::io::Cursor;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ArtifactHandle, ArtifactStore};
use crate::error::Log2TxtError;
use crate::pipeline::sanitize::is_plain_name;

/// In-memory artifact store for tests and embedding.
///
/// Content is copied on read and open, so a later write never changes bytes
/// a reader already holds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.artifacts.read().await.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn list(&self) -> Result<Vec<String>, Log2TxtError> {
        Ok(self.artifacts.read().await.keys().cloned().collect())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, Log2TxtError> {
        self.artifacts
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Log2TxtError::not_found(name))
    }

    async fn open(&self, name: &str) -> Result<ArtifactHandle, Log2TxtError> {
        let content = self.read(name).await?;
        Ok(ArtifactHandle {
            name: name.to_string(),
            len: content.len() as u64,
            reader: Box::new(Cursor::new(content)),
        })
    }

    async fn write(&self, name: &str, content: &[u8]) -> Result<(), Log2TxtError> {
        if !is_plain_name(name) {
            return Err(Log2TxtError::Validation(format!(
                "invalid artifact name '{name}'"
            )));
        }
        self.artifacts
            .write()
            .await
            .insert(name.to_string(), content.to_vec());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<bool, Log2TxtError> {
        Ok(self.artifacts.write().await.remove(name).is_some())
    }

    async fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn roundtrip_and_listing_order() {
        let store = MemoryStore::new();
        store.write("b.txt", b"b").await.unwrap();
        store.write("a.txt", b"a").await.unwrap();
        assert_eq!(store.list().await.unwrap(), ["a.txt", "b.txt"]);
        assert_eq!(store.read("a.txt").await.unwrap(), b"a");
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn open_snapshot_survives_overwrite() {
        let store = MemoryStore::new();
        store.write("a.txt", b"old").await.unwrap();
        let mut handle = store.open("a.txt").await.unwrap();
        store.write("a.txt", b"new").await.unwrap();

        let mut buf = String::new();
        handle.reader.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "old");
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let store = MemoryStore::new();
        store.write("a.txt", b"a").await.unwrap();
        assert!(store.remove("a.txt").await.unwrap());
        assert!(!store.remove("a.txt").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn rejects_nested_write() {
        let store = MemoryStore::new();
        let err = store.write("dir/a.txt", b"x").await.unwrap_err();
        assert!(matches!(err, Log2TxtError::Validation(_)));
    }
}
