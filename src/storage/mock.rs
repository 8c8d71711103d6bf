use super::KeyValueStore;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockStore {
    data: Arc<Mutex<HashMap<(String, String), String>>>,
    write_count: Arc<Mutex<usize>>,
    read_count: Arc<Mutex<usize>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(self, token: &str, key: &str, data: &str) -> Self {
        self.data
            .lock()
            .unwrap()
            .insert((token.to_string(), key.to_string()), data.to_string());
        self
    }

    pub fn with_write_failure(self, fail: bool) -> Self {
        *self.fail_writes.lock().unwrap() = fail;
        self
    }

    pub fn get_write_count(&self) -> usize {
        *self.write_count.lock().unwrap()
    }

    pub fn get_read_count(&self) -> usize {
        *self.read_count.lock().unwrap()
    }

    pub fn get(&self, token: &str, key: &str) -> Option<String> {
        self.data
            .lock()
            .unwrap()
            .get(&(token.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl KeyValueStore for MockStore {
    async fn write_user_data(&self, token: &str, key: &str, data: &str) -> Result<()> {
        *self.write_count.lock().unwrap() += 1;

        if *self.fail_writes.lock().unwrap() {
            return Err(Error::PersistenceWrite("Mock failure".to_string()));
        }

        self.data
            .lock()
            .unwrap()
            .insert((token.to_string(), key.to_string()), data.to_string());
        Ok(())
    }

    async fn read_user_data(&self, token: &str, key: &str) -> Result<String> {
        *self.read_count.lock().unwrap() += 1;

        self.get(token, key)
            .ok_or_else(|| Error::SnapshotMissing(format!("{}/{}", token, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_store_write_and_read() {
        let store = MockStore::new();

        store.write_user_data("t", "k", "blob").await.unwrap();
        assert_eq!(store.get_write_count(), 1);

        assert_eq!(store.read_user_data("t", "k").await.unwrap(), "blob");
        assert_eq!(store.get_read_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_store_write_failure() {
        let store = MockStore::new().with_write_failure(true);

        let err = store.write_user_data("t", "k", "blob").await.unwrap_err();
        assert!(matches!(err, Error::PersistenceWrite(_)));
        assert!(store.get("t", "k").is_none());
    }

    #[tokio::test]
    async fn test_mock_store_missing_key() {
        let store = MockStore::new().with_data("t", "other", "x");
        let err = store.read_user_data("t", "k").await.unwrap_err();
        assert!(matches!(err, Error::SnapshotMissing(_)));
    }
}
