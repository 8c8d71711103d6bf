//! Extension-private key/value storage
//!
//! The host scopes stored data by an opaque execution token. Blobs are
//! opaque strings to the store; callers own their format.

pub mod file;
pub mod mock;

pub use file::FileStore;
pub use mock::MockStore;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn write_user_data(&self, token: &str, key: &str, data: &str) -> Result<()>;
    /// Missing data is [`crate::Error::SnapshotMissing`].
    async fn read_user_data(&self, token: &str, key: &str) -> Result<String>;
}
