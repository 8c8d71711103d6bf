use super::MirrorAdapter;
use crate::models::MirrorId;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted mirror for tests and harnesses.
///
/// Responses cycle in the order they were added; `None` entries fail with a
/// 503 status. With no scripted responses, one image derived from the
/// prompt is returned.
#[derive(Clone)]
pub struct MockMirror {
    id: MirrorId,
    responses: Arc<Mutex<Vec<Option<Vec<String>>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockMirror {
    pub fn new(id: MirrorId) -> Self {
        Self {
            id,
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn with_images(self, images: Vec<String>) -> Self {
        self.responses.lock().unwrap().push(Some(images));
        self
    }

    pub fn with_failure(self) -> Self {
        self.responses.lock().unwrap().push(None);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MirrorAdapter for MockMirror {
    fn id(&self) -> MirrorId {
        self.id
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<String>> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = {
            let responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Some(vec![format!("https://mock-mirror.example.com/{}/{}", self.id as i64, prompt)])
            } else {
                responses[(call - 1) % responses.len()].clone()
            }
        };

        scripted.ok_or_else(|| Error::MirrorStatus {
            mirror: self.id,
            status: 503,
            body: "mock failure".to_string(),
        })
    }
}
