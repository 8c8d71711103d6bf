use super::KeyValueStore;
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each `(token, key)` pair as `<root>/<token>/<key>.json`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, token: &str, key: &str) -> PathBuf {
        self.root
            .join(path_component(token))
            .join(format!("{}.json", path_component(key)))
    }
}

/// Tokens and keys are opaque; keep them from escaping the root.
fn path_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        format!("_{}", cleaned)
    } else {
        cleaned
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn write_user_data(&self, token: &str, key: &str, data: &str) -> Result<()> {
        let path = self.path_for(token, key);
        let dir = path
            .parent()
            .ok_or_else(|| Error::PersistenceWrite(format!("No parent for {}", path.display())))?;

        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            Error::PersistenceWrite(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        // Write beside the target, then rename, so readers never see half a file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await.map_err(|e| {
            Error::PersistenceWrite(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            Error::PersistenceWrite(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        tracing::debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    async fn read_user_data(&self, token: &str, key: &str) -> Result<String> {
        let path = self.path_for(token, key);
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::SnapshotMissing(path.display().to_string()))
            }
            Err(e) => Err(Error::PersistenceRead(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store
            .write_user_data("token-1", "imageUrls", r#"{"a":["u"]}"#)
            .await
            .unwrap();

        let data = store.read_user_data("token-1", "imageUrls").await.unwrap();
        assert_eq!(data, r#"{"a":["u"]}"#);
        assert!(dir.path().join("token-1").join("imageUrls.json").exists());
        assert!(!dir.path().join("token-1").join("imageUrls.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_tokens_are_isolated() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.write_user_data("one", "k", "1").await.unwrap();
        let err = store.read_user_data("two", "k").await.unwrap_err();
        assert!(matches!(err, Error::SnapshotMissing(_)));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_contents() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.write_user_data("t", "k", "first").await.unwrap();
        store.write_user_data("t", "k", "second").await.unwrap();
        assert_eq!(store.read_user_data("t", "k").await.unwrap(), "second");
    }

    #[test]
    fn test_path_components_cannot_escape_root() {
        assert_eq!(path_component("../../etc"), ".._.._etc");
        assert_eq!(path_component(".."), "_..");
        assert_eq!(path_component(""), "_");
        assert_eq!(path_component("ext:token/1"), "ext_token_1");
    }
}
