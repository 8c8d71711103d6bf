//! Host capabilities the generator depends on.
//!
//! The generator is written against [`CommandBus`] and the storage trait so
//! it can run inside a plugin host or standalone. [`LocalCommandBus`] is the
//! in-process bus used by the CLI and tests.

use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Identity the host hands an extension at activation.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub execution_token: String,
}

impl ExecutionContext {
    pub fn new(execution_token: impl Into<String>) -> Self {
        Self {
            execution_token: execution_token.into(),
        }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, args: Vec<Value>) -> Result<Value>;
}

#[async_trait]
pub trait CommandBus: Send + Sync {
    async fn register_command(&self, name: &str, handler: Arc<dyn CommandHandler>) -> Result<()>;
}

#[derive(Default)]
pub struct LocalCommandBus {
    handlers: RwLock<HashMap<String, Arc<dyn CommandHandler>>>,
}

impl LocalCommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn send_command(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        let handler = self
            .handlers
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Command(format!("No handler registered for '{}'", name)))?;

        handler.handle(args).await
    }

    pub async fn is_registered(&self, name: &str) -> bool {
        self.handlers.read().await.contains_key(name)
    }
}

#[async_trait]
impl CommandBus for LocalCommandBus {
    async fn register_command(&self, name: &str, handler: Arc<dyn CommandHandler>) -> Result<()> {
        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(name) {
            return Err(Error::Command(format!(
                "Command '{}' is already registered",
                name
            )));
        }
        handlers.insert(name.to_string(), handler);
        tracing::debug!("Registered command {}", name);
        Ok(())
    }
}
